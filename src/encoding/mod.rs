//! Text decoding layers.
//!
//! Provides base64 and ROT-13 decoding, ordered layer chains, and
//! speculative auto-detection ([`detect`]).

pub mod detect;

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

pub use detect::{auto_detect, looks_like_base64, AttemptError, DetectMethod, Detection};

/// Standard alphabet, padding required, non-zero trailing bits accepted.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Errors from a single decode attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid base64 character {0:?}")]
    InvalidCharacter(char),

    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A chain stopped at a recognized layer that failed to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed at layer {position} ({encoding}): {source}")]
pub struct ChainError {
    /// 1-based position in the chain.
    pub position: usize,
    pub encoding: Encoding,
    pub source: DecodeError,
}

/// Layer name that is neither `base64` nor `rot13`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown encoding type: {0}")]
pub struct UnknownEncoding(pub String);

/// A text encoding that can be peeled off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Base64,
    Rot13,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
            Encoding::Rot13 => "rot13",
        }
    }

    /// Decodes one layer.
    pub fn decode(&self, text: &str) -> Result<String, DecodeError> {
        match self {
            Encoding::Base64 => decode_base64(text),
            Encoding::Rot13 => Ok(decode_rot13(text)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base64" | "b64" => Ok(Encoding::Base64),
            "rot13" | "rot-13" | "rot_13" => Ok(Encoding::Rot13),
            other => Err(UnknownEncoding(other.to_string())),
        }
    }
}

/// Returns true for characters of the standard base64 alphabet, including `=`.
pub fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// Decodes base64 text to raw bytes. Whitespace anywhere is ignored.
pub fn decode_base64_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some(bad) = cleaned.chars().find(|&c| !is_base64_char(c)) {
        return Err(DecodeError::InvalidCharacter(bad));
    }
    Ok(LENIENT_BASE64.decode(cleaned)?)
}

/// Decodes base64 text and reads the bytes as UTF-8, replacing invalid sequences.
pub fn decode_base64(text: &str) -> Result<String, DecodeError> {
    let bytes = decode_base64_bytes(text)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Rotates ASCII letters by 13 places, preserving case. Self-inverse.
pub fn decode_rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}

/// Parses layer names, dropping unrecognized ones with a warning.
pub fn parse_layers<I, S>(names: I) -> Vec<Encoding>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| match name.as_ref().parse::<Encoding>() {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                warn!("{}, passing value through", e);
                None
            }
        })
        .collect()
}

/// Applies each layer in order, feeding each output to the next.
///
/// Stops at the first layer that fails.
pub fn decode_chain(text: &str, layers: &[Encoding]) -> Result<String, ChainError> {
    let mut current = text.to_string();
    for (i, encoding) in layers.iter().enumerate() {
        debug!("Layer {}: {}", i + 1, encoding);
        current = encoding.decode(&current).map_err(|source| ChainError {
            position: i + 1,
            encoding: *encoding,
            source,
        })?;
    }
    Ok(current)
}

/// [`decode_chain`] over layer names; unknown names pass the value through.
pub fn decode_chain_named<S: AsRef<str>>(text: &str, names: &[S]) -> Result<String, ChainError> {
    decode_chain(text, &parse_layers(names))
}
