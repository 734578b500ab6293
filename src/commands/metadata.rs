//! Metadata inspection command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ghostsift::extract_metadata;

use super::CommandExecutor;

/// Show file and image properties.
#[derive(Args, Debug)]
pub struct MetadataCommand {
    /// Image to inspect
    pub image: PathBuf,

    /// Save the metadata as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for MetadataCommand {
    fn execute(&self) -> Result<()> {
        let metadata = extract_metadata(&self.image)
            .with_context(|| format!("Failed to read metadata of {}", self.image.display()))?;

        let file = &metadata.file_properties;
        println!("=== FILE PROPERTIES ===");
        println!("Name: {}", file.name);
        println!("Path: {}", file.path);
        println!("Size: {}", file.size_readable);

        let image = &metadata.image_properties;
        println!();
        println!("=== IMAGE PROPERTIES ===");
        println!("Format: {}", image.format.as_deref().unwrap_or("unknown"));
        println!("Color type: {}", image.color_type);
        println!("Dimensions: {}", image.dimensions);

        if !metadata.potential_hidden_text.is_empty() {
            println!();
            println!("=== POTENTIAL HIDDEN TEXT ===");
            for line in &metadata.potential_hidden_text {
                println!("{}", line);
            }
        }

        if let Some(path) = &self.output {
            metadata
                .write_json(path)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("\nMetadata saved to: {}", path.display());
        }
        Ok(())
    }
}
