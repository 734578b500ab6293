//! Final decryption of an assembled candidate.
//!
//! Tries XOR and/or AES-CBC with a supplied key. With [`CipherSelector::Auto`]
//! both run, and the first result (XOR before AES) that contains an
//! alphabetic character wins.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use super::block::{aes_cbc_decrypt, BLOCK_SIZE};
use super::xor::xor_decrypt;
use crate::encoding::decode_base64_bytes;

/// Errors that can occur during decryption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Ciphertext length {0} is not a multiple of the block size")]
    InvalidLength(usize),

    #[error("Cipher error: {0}")]
    Cipher(String),

    #[error("No decryption method produced a result")]
    NoCandidate,

    #[error("Unknown decryption method '{0}' (expected xor, aes or auto)")]
    UnknownMethod(String),
}

/// A concrete decryption method, in auto-selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMethod {
    Xor,
    Aes,
}

impl CipherMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherMethod::Xor => "xor",
            CipherMethod::Aes => "aes",
        }
    }

    pub fn decrypt(
        &self,
        data: &[u8],
        key: &[u8],
        iv: Option<&[u8; BLOCK_SIZE]>,
    ) -> Result<Vec<u8>, DecryptError> {
        match self {
            CipherMethod::Xor => xor_decrypt(data, key),
            CipherMethod::Aes => aes_cbc_decrypt(data, key, iv),
        }
    }
}

impl fmt::Display for CipherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which methods to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSelector {
    Xor,
    Aes,
    Auto,
}

impl CipherSelector {
    pub fn methods(&self) -> &'static [CipherMethod] {
        match self {
            CipherSelector::Xor => &[CipherMethod::Xor],
            CipherSelector::Aes => &[CipherMethod::Aes],
            CipherSelector::Auto => &[CipherMethod::Xor, CipherMethod::Aes],
        }
    }
}

impl Default for CipherSelector {
    fn default() -> Self {
        CipherSelector::Auto
    }
}

impl FromStr for CipherSelector {
    type Err = DecryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xor" => Ok(CipherSelector::Xor),
            "aes" => Ok(CipherSelector::Aes),
            "auto" => Ok(CipherSelector::Auto),
            _ => Err(DecryptError::UnknownMethod(s.to_string())),
        }
    }
}

/// Assembled data handed to the decryptor.
#[derive(Debug, Clone, Copy)]
pub enum Ciphertext<'a> {
    /// Base64 is tried first; on failure the text's own bytes are used.
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl Ciphertext<'_> {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Ciphertext::Text(text) => decode_base64_bytes(text).unwrap_or_else(|e| {
                debug!("Ciphertext is not base64 ({}), using raw text bytes", e);
                text.as_bytes().to_vec()
            }),
            Ciphertext::Bytes(bytes) => bytes.to_vec(),
        }
    }
}

/// The selected plaintext and every candidate that was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decryption {
    pub method: CipherMethod,
    pub plaintext: String,
    pub candidates: BTreeMap<CipherMethod, String>,
}

/// Decryptor bound to a key and an optional explicit IV.
#[derive(Debug, Clone)]
pub struct SymmetricDecryptor {
    key: Vec<u8>,
    iv: Option<[u8; BLOCK_SIZE]>,
}

impl SymmetricDecryptor {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
            iv: None,
        }
    }

    /// Uses an explicit IV for AES instead of deriving one from the key.
    pub fn with_iv(mut self, iv: [u8; BLOCK_SIZE]) -> Self {
        self.iv = Some(iv);
        self
    }

    pub fn decrypt(
        &self,
        data: Ciphertext<'_>,
        selector: CipherSelector,
    ) -> Result<Decryption, DecryptError> {
        let bytes = data.to_bytes();
        let mut candidates = BTreeMap::new();
        let mut last_error = None;

        for method in selector.methods() {
            match method.decrypt(&bytes, &self.key, self.iv.as_ref()) {
                Ok(plain) => {
                    let text = String::from_utf8_lossy(&plain).into_owned();
                    debug!("{} decryption result: {}", method, preview(&text));
                    candidates.insert(*method, text);
                }
                Err(e) => {
                    warn!("{} decryption failed: {}", method, e);
                    last_error = Some(e);
                }
            }
        }

        let chosen = match selector {
            CipherSelector::Auto => candidates
                .iter()
                .find(|(_, text)| text.chars().any(char::is_alphabetic))
                .or_else(|| candidates.iter().next()),
            _ => candidates.iter().next(),
        };

        match chosen {
            Some((&method, text)) => {
                debug!("Best result from {}", method);
                Ok(Decryption {
                    method,
                    plaintext: text.clone(),
                    candidates: candidates.clone(),
                })
            }
            None => Err(match selector {
                CipherSelector::Auto => DecryptError::NoCandidate,
                _ => last_error.unwrap_or(DecryptError::NoCandidate),
            }),
        }
    }
}

/// Decrypts with a derived IV.
pub fn decrypt_final(
    data: Ciphertext<'_>,
    key: impl AsRef<[u8]>,
    selector: CipherSelector,
) -> Result<Decryption, DecryptError> {
    SymmetricDecryptor::new(key).decrypt(data, selector)
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}
