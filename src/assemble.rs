//! Fragment assembly.
//!
//! Concatenates decoded fragments into one candidate ciphertext, either in the
//! order given or by key. Keyed collections without an explicit order are
//! joined in ascending key order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during assembly.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("No fragments provided")]
    NoFragments,

    #[error("All {0} fragments were empty")]
    EmptyAssembly(usize),

    #[error("Fragment directory error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A piece of candidate hidden text, identified by where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Provenance, e.g. `lsb_red` or `spiral_clockwise_blue`.
    pub source: String,
    /// Decoding method that produced `data`, if any.
    pub method: Option<String>,
    pub data: String,
    /// File the fragment was written to.
    pub file: Option<PathBuf>,
}

impl Fragment {
    pub fn new(source: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            method: None,
            data: data.into(),
            file: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// The assembled candidate plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assembly {
    pub text: String,
    /// Non-empty fragments that were joined.
    pub fragment_count: usize,
    /// Length of `text` in characters.
    pub total_length: usize,
}

/// Joins fragments in the order given, skipping empty ones.
pub fn assemble<S: AsRef<str>>(fragments: &[S]) -> Result<Assembly, AssemblyError> {
    join(fragments.iter().map(|f| f.as_ref()), fragments.len())
}

/// Joins keyed fragments, in `order` if given, otherwise by ascending key.
///
/// Keys in `order` with no fragment contribute nothing.
pub fn assemble_keyed<K: Ord>(
    fragments: &BTreeMap<K, String>,
    order: Option<&[K]>,
) -> Result<Assembly, AssemblyError> {
    match order {
        Some(order) => join(
            order
                .iter()
                .map(|key| fragments.get(key).map(String::as_str).unwrap_or("")),
            fragments.len(),
        ),
        None => join(fragments.values().map(String::as_str), fragments.len()),
    }
}

fn join<'a, I>(parts: I, available: usize) -> Result<Assembly, AssemblyError>
where
    I: Iterator<Item = &'a str>,
{
    if available == 0 {
        return Err(AssemblyError::NoFragments);
    }

    let mut text = String::new();
    let mut fragment_count = 0;
    for part in parts.filter(|p| !p.is_empty()) {
        text.push_str(part);
        fragment_count += 1;
    }

    if fragment_count == 0 {
        return Err(AssemblyError::EmptyAssembly(available));
    }

    let total_length = text.chars().count();
    debug!(
        "Assembled {} fragments, {} characters",
        fragment_count, total_length
    );

    Ok(Assembly {
        text,
        fragment_count,
        total_length,
    })
}

/// Loads every regular file in `directory` as a fragment keyed by file name.
///
/// Unreadable files are skipped with a warning. Content is read as lossy UTF-8.
pub fn load_fragments_from_directory<P: AsRef<Path>>(
    directory: P,
) -> Result<BTreeMap<String, String>, AssemblyError> {
    let mut fragments = BTreeMap::new();

    for entry in fs::read_dir(directory.as_ref())? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        match fs::read(&path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                debug!("Loaded fragment: {} ({} chars)", name, content.chars().count());
                fragments.insert(name, content);
            }
            Err(e) => warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    Ok(fragments)
}
