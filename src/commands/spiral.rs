//! Spiral LSB extraction command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ghostsift::report::render_channel_reports;
use ghostsift::{ChannelReport, ChannelSelector, Direction, LsbExtractor, Traversal};

use super::{save_output, CommandExecutor};

/// Read LSBs along a square spiral that starts at the image center.
#[derive(Args, Debug)]
pub struct SpiralCommand {
    /// Image to read
    pub image: PathBuf,

    /// Spiral direction: clockwise or counterclockwise
    #[arg(short, long, default_value = "clockwise")]
    pub direction: Direction,

    /// Channel to extract: red, green, blue or all
    #[arg(short, long, default_value = "all")]
    pub channel: ChannelSelector,

    /// Save the report to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for SpiralCommand {
    fn execute(&self) -> Result<()> {
        let extractor = LsbExtractor::from_file(&self.image)
            .with_context(|| format!("Failed to load image {}", self.image.display()))?;

        let reports: Vec<ChannelReport> = extractor
            .planes(self.channel, Traversal::Spiral(self.direction))
            .iter()
            .map(ChannelReport::from_plane)
            .collect();

        let header = format!("Spiral Direction: {}", self.direction.display_name());
        let rendered = render_channel_reports(&reports, Some(&header));
        print!("{}", rendered);

        if let Some(path) = &self.output {
            save_output(path, &rendered)?;
        }
        Ok(())
    }
}
