//! Raster LSB extraction command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ghostsift::report::render_channel_reports;
use ghostsift::{ChannelReport, ChannelSelector, LsbExtractor, Traversal};

use super::{save_output, CommandExecutor};

/// Extract least significant bits from image channels in raster order.
#[derive(Args, Debug)]
pub struct ExtractCommand {
    /// Image to read
    pub image: PathBuf,

    /// Channel to extract: red, green, blue or all
    #[arg(short, long, default_value = "all")]
    pub channel: ChannelSelector,

    /// Save the report to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for ExtractCommand {
    fn execute(&self) -> Result<()> {
        let extractor = LsbExtractor::from_file(&self.image)
            .with_context(|| format!("Failed to load image {}", self.image.display()))?;
        let (width, height) = extractor.dimensions();
        println!("Image: {}x{}", width, height);

        let reports: Vec<ChannelReport> = extractor
            .planes(self.channel, Traversal::Raster)
            .iter()
            .map(ChannelReport::from_plane)
            .collect();

        for report in &reports {
            if report.possibly_corrupted {
                println!("Warning: {} channel may contain binary data", report.channel);
            }
        }

        let rendered = render_channel_reports(&reports, None);
        print!("{}", rendered);

        if let Some(path) = &self.output {
            save_output(path, &rendered)?;
        }
        Ok(())
    }
}
