//! Full analysis command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use ghostsift::{run_analysis, AnalysisConfig};

use super::CommandExecutor;

/// Run every extraction and decoding stage on an image.
///
/// Writes channel reports, metadata, fragments and the final flag under the
/// configured output and fragments directories.
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Image to analyze
    pub image: PathBuf,

    /// JSON configuration file (defaults apply if it does not exist)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    #[arg(skip)]
    pub verbose: bool,
}

impl CommandExecutor for AnalyzeCommand {
    fn execute(&self) -> Result<()> {
        let mut config = AnalysisConfig::load(&self.config)
            .with_context(|| format!("Failed to load config {}", self.config.display()))?;
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        config.verbose |= self.verbose;

        if !self.image.exists() {
            bail!("Image file '{}' not found", self.image.display());
        }

        println!("Analyzing: {}", self.image.display());
        println!("Output directory: {}", config.output_directory);

        let report = run_analysis(&self.image, &config)
            .with_context(|| format!("Analysis of {} failed", self.image.display()))?;

        println!();
        println!("=== ANALYSIS SUMMARY ===");
        println!(
            "Metadata extracted: {}",
            if report.metadata.is_some() { "Yes" } else { "No" }
        );
        println!("LSB channels analyzed: {}", report.lsb.len());
        println!("Spiral patterns read: {}", report.spiral.len());
        println!("Fragments collected: {}", report.fragments.len());
        println!("Decoded fragments: {}", report.decoded_fragments.len());

        if config.verbose {
            for fragment in &report.fragments {
                println!("  {} ({} chars)", fragment.source, fragment.data.chars().count());
            }
        }

        match &report.final_flag {
            Some(decryption) => {
                println!();
                println!("=== FINAL FLAG ({}) ===", decryption.method);
                println!("{}", decryption.plaintext);
            }
            None => println!("\nNo flag found"),
        }

        println!("\nResults saved to: {}/", config.output_directory);
        Ok(())
    }
}
