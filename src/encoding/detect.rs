//! Speculative encoding detection.
//!
//! Tries base64, ROT-13 and both compositions on a string and records every
//! attempt. Success is syntactic only: a method "works" when its decode step
//! does not fail. Several methods may succeed on the same input; ranking the
//! candidates is up to the caller.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::Serialize;
use thiserror::Error;

use super::{decode_base64, decode_rot13, is_base64_char, DecodeError};

/// Detection methods, in the order they are attempted and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectMethod {
    Base64,
    Rot13,
    Base64ThenRot13,
    Rot13ThenBase64,
}

impl DetectMethod {
    pub const ALL: [DetectMethod; 4] = [
        DetectMethod::Base64,
        DetectMethod::Rot13,
        DetectMethod::Base64ThenRot13,
        DetectMethod::Rot13ThenBase64,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectMethod::Base64 => "base64",
            DetectMethod::Rot13 => "rot13",
            DetectMethod::Base64ThenRot13 => "base64_then_rot13",
            DetectMethod::Rot13ThenBase64 => "rot13_then_base64",
        }
    }
}

impl fmt::Display for DetectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a detection attempt produced no candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("input contains characters outside the base64 alphabet")]
    NotBase64Alphabet,

    #[error("ROT-13 output is identical to the input")]
    Unchanged,

    #[error("decoded output is empty")]
    Empty,

    #[error("requires a successful {0} attempt")]
    Prerequisite(DetectMethod),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Outcome of one detection attempt.
pub type Attempt = Result<String, AttemptError>;

/// Every attempt made by [`auto_detect`], in [`DetectMethod`] order.
#[derive(Debug, Clone)]
pub struct Detection {
    attempts: Vec<(DetectMethod, Attempt)>,
}

impl Detection {
    pub fn attempts(&self) -> &[(DetectMethod, Attempt)] {
        &self.attempts
    }

    /// Successful candidates, in method order.
    pub fn successes(&self) -> impl Iterator<Item = (DetectMethod, &str)> {
        self.attempts
            .iter()
            .filter_map(|(method, attempt)| attempt.as_deref().ok().map(|text| (*method, text)))
    }

    /// Method label → decoded text, for every successful attempt.
    pub fn decoded(&self) -> BTreeMap<DetectMethod, String> {
        self.successes()
            .map(|(method, text)| (method, text.to_string()))
            .collect()
    }

    pub fn get(&self, method: DetectMethod) -> Option<&str> {
        self.successes()
            .find(|(m, _)| *m == method)
            .map(|(_, text)| text)
    }

    /// First successful candidate.
    pub fn first(&self) -> Option<(DetectMethod, &str)> {
        self.successes().next()
    }

    /// Returns true if no method succeeded.
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }
}

/// Syntactic gate: every non-whitespace character is in the base64 alphabet.
pub fn looks_like_base64(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || is_base64_char(c))
}

fn non_empty(result: Result<String, DecodeError>) -> Attempt {
    match result {
        Ok(text) if text.is_empty() => Err(AttemptError::Empty),
        Ok(text) => Ok(text),
        Err(e) => Err(e.into()),
    }
}

/// Attempts every detection method on `text`.
pub fn auto_detect(text: &str) -> Detection {
    let base64 = if looks_like_base64(text) {
        non_empty(decode_base64(text))
    } else {
        Err(AttemptError::NotBase64Alphabet)
    };

    let rotated = decode_rot13(text);
    let rot13 = if rotated != text {
        Ok(rotated.clone())
    } else {
        Err(AttemptError::Unchanged)
    };

    let base64_then_rot13 = match &base64 {
        Ok(decoded) => Ok(decode_rot13(decoded)),
        Err(_) => Err(AttemptError::Prerequisite(DetectMethod::Base64)),
    };

    // Runs on the rotated text even when ROT-13 changed nothing.
    let rot13_then_base64 = if rotated.is_empty() {
        Err(AttemptError::Empty)
    } else {
        non_empty(decode_base64(&rotated))
    };

    let attempts = vec![
        (DetectMethod::Base64, base64),
        (DetectMethod::Rot13, rot13),
        (DetectMethod::Base64ThenRot13, base64_then_rot13),
        (DetectMethod::Rot13ThenBase64, rot13_then_base64),
    ];

    for (method, attempt) in &attempts {
        match attempt {
            Ok(_) => debug!("Applied {}", method),
            Err(e) => debug!("{} not applicable: {}", method, e),
        }
    }

    Detection { attempts }
}
