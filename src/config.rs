//! Analysis configuration.
//!
//! Loaded from a JSON object; keys that are absent keep their defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default output directory.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "output";

/// Default fragments directory.
pub const DEFAULT_FRAGMENTS_DIRECTORY: &str = "fragments";

/// Default log file name, relative to the output directory.
pub const DEFAULT_LOG_FILE: &str = "analysis.log";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Configuration for a full analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory for reports, metadata and the final flag.
    pub output_directory: String,

    /// Directory for fragment files.
    pub fragments_directory: String,

    /// Log file name inside `output_directory`.
    pub log_file: String,

    pub verbose: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_directory: DEFAULT_OUTPUT_DIRECTORY.to_string(),
            fragments_directory: DEFAULT_FRAGMENTS_DIRECTORY.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            verbose: false,
        }
    }
}

impl AnalysisConfig {
    /// Loads configuration, falling back to defaults if `path` does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_directory)
    }

    pub fn fragments_dir(&self) -> PathBuf {
        PathBuf::from(&self.fragments_directory)
    }

    /// `output_directory/log_file`.
    pub fn log_path(&self) -> PathBuf {
        self.output_dir().join(&self.log_file)
    }
}
