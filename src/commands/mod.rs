//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod analyze;
mod assemble;
mod decode;
mod extract;
mod metadata;
mod spiral;

pub use analyze::AnalyzeCommand;
pub use assemble::AssembleCommand;
pub use decode::DecodeCommand;
pub use extract::ExtractCommand;
pub use metadata::MetadataCommand;
pub use spiral::SpiralCommand;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self) -> Result<()>;
}

/// Writes `contents` to `path` and reports where it went.
fn save_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write to {}", path.display()))?;
    println!("Saved to: {}", path.display());
    Ok(())
}
