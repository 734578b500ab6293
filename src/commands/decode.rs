//! Decode command - peel base64 and ROT-13 layers off text.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use ghostsift::auto_detect;
use ghostsift::encoding::{decode_base64, decode_chain_named, decode_rot13};

use super::{save_output, CommandExecutor};

/// Longest decoded candidate shown per auto-detect method.
const DISPLAY_LIMIT: usize = 500;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeType {
    Base64,
    Rot13,
    Auto,
}

/// Decode base64 or ROT-13 data.
///
/// Input can be given as:
/// - Direct text argument
/// - `-` to read stdin
/// - A file: --file data.txt
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Data to decode (use - for stdin)
    #[arg(conflicts_with = "file")]
    pub input: Option<String>,

    /// Read input from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Decoding type
    #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
    pub decode_type: DecodeType,

    /// Comma-separated encoding layers, applied in order (e.g. "base64,rot13")
    #[arg(short, long, value_delimiter = ',')]
    pub layers: Option<Vec<String>>,

    /// Save decoded data to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self) -> Result<()> {
        let data = self.read_input()?;

        let result = if let Some(layers) = &self.layers {
            let names: Vec<&str> = layers.iter().map(|l| l.trim()).collect();
            decode_chain_named(&data, &names).context("Layered decoding failed")?
        } else {
            match self.decode_type {
                DecodeType::Base64 => decode_base64(&data).context("Base64 decoding failed")?,
                DecodeType::Rot13 => decode_rot13(&data),
                DecodeType::Auto => {
                    let detection = auto_detect(&data);
                    let Some((_, first)) = detection.first() else {
                        bail!("No successful decoding methods found");
                    };

                    println!("=== DECODING RESULTS ===");
                    for (method, decoded) in detection.successes() {
                        let shown: String = decoded.chars().take(DISPLAY_LIMIT).collect();
                        println!("\n{}:\n{}", method, shown);
                    }
                    first.to_string()
                }
            }
        };

        if self.layers.is_some() || self.decode_type != DecodeType::Auto {
            println!("{}", result);
        }

        if let Some(path) = &self.output {
            save_output(path, &result)?;
        }
        Ok(())
    }
}

impl DecodeCommand {
    fn read_input(&self) -> Result<String> {
        if let Some(path) = &self.file {
            return fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }

        match self.input.as_deref() {
            Some("-") => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read from stdin")?;
                Ok(buf)
            }
            Some(text) => Ok(text.to_string()),
            None => bail!("No input provided. Pass data, '-' for stdin, or --file"),
        }
    }
}
