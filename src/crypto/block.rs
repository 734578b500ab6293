//! AES-CBC decryption with heuristic key handling.
//!
//! Keys of any length are squeezed into an AES key size by truncation or
//! zero-padding. Without an explicit IV, the IV is the first 16 bytes of
//! SHA-256 over the normalized key.

use aes::cipher::block_padding::{NoPadding, Pkcs7, RawPadding};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use log::debug;
use sha2::{Digest, Sha256};

use super::symmetric::DecryptError;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

fn cipher_error<E: std::fmt::Display>(e: E) -> DecryptError {
    DecryptError::Cipher(e.to_string())
}

/// Fits a key to 16, 24 or 32 bytes.
///
/// Up to 16 bytes is zero-padded to 16; 17-23 truncated to 16; 24-31
/// truncated to 24; 32 or more truncated to 32.
pub fn normalize_key(key: &[u8]) -> Vec<u8> {
    let size = match key.len() {
        0..=23 => 16,
        24..=31 => 24,
        _ => 32,
    };
    let mut normalized = key[..key.len().min(size)].to_vec();
    normalized.resize(size, 0);
    normalized
}

/// First 16 bytes of SHA-256 over `key`.
pub fn derive_iv(key: &[u8]) -> [u8; BLOCK_SIZE] {
    let digest = Sha256::digest(key);
    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&digest[..BLOCK_SIZE]);
    iv
}

/// Drops PKCS#7 padding from the final block, keeping `plain` whole if the
/// padding is malformed.
fn unpad_or_keep(mut plain: Vec<u8>) -> Vec<u8> {
    let Some(last_block) = plain.len().checked_sub(BLOCK_SIZE) else {
        return plain;
    };
    match Pkcs7::raw_unpad(&plain[last_block..]) {
        Ok(body) => {
            let keep = last_block + body.len();
            plain.truncate(keep);
        }
        Err(_) => debug!("PKCS#7 padding invalid, keeping padded plaintext"),
    }
    plain
}

/// Decrypts AES-CBC ciphertext.
///
/// If the PKCS#7 padding is malformed, the padded plaintext is returned as is.
pub fn aes_cbc_decrypt(
    ciphertext: &[u8],
    key: &[u8],
    iv: Option<&[u8; BLOCK_SIZE]>,
) -> Result<Vec<u8>, DecryptError> {
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecryptError::InvalidLength(ciphertext.len()));
    }

    let key = normalize_key(key);
    let iv = iv.copied().unwrap_or_else(|| derive_iv(&key));
    let mut buf = ciphertext.to_vec();

    let plain_len = match key.len() {
        16 => Aes128CbcDec::new_from_slices(&key, &iv)
            .map_err(cipher_error)?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(cipher_error)?
            .len(),
        24 => Aes192CbcDec::new_from_slices(&key, &iv)
            .map_err(cipher_error)?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(cipher_error)?
            .len(),
        _ => Aes256CbcDec::new_from_slices(&key, &iv)
            .map_err(cipher_error)?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(cipher_error)?
            .len(),
    };
    buf.truncate(plain_len);

    Ok(unpad_or_keep(buf))
}

/// Encrypts with AES-CBC and PKCS#7 padding, using the same key and IV
/// handling as [`aes_cbc_decrypt`].
pub fn aes_cbc_encrypt(
    plaintext: &[u8],
    key: &[u8],
    iv: Option<&[u8; BLOCK_SIZE]>,
) -> Result<Vec<u8>, DecryptError> {
    let key = normalize_key(key);
    let iv = iv.copied().unwrap_or_else(|| derive_iv(&key));

    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(&key, &iv)
            .map_err(cipher_error)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(&key, &iv)
            .map_err(cipher_error)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => Aes256CbcEnc::new_from_slices(&key, &iv)
            .map_err(cipher_error)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };
    Ok(ciphertext)
}
