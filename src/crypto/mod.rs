//! Final-stage decryption.
//!
//! - Repeating-key XOR
//! - AES-CBC with key normalization and key-derived IV
//! - Automatic method selection by readability

pub mod block;
pub mod symmetric;
pub mod xor;

pub use block::{aes_cbc_decrypt, aes_cbc_encrypt, derive_iv, normalize_key, BLOCK_SIZE};
pub use symmetric::{
    decrypt_final, CipherMethod, CipherSelector, Ciphertext, DecryptError, Decryption,
    SymmetricDecryptor,
};
pub use xor::xor_decrypt;
