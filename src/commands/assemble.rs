//! Assemble command - join fragments and optionally decrypt the result.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use ghostsift::{
    assemble_keyed, load_fragments_from_directory, CipherSelector, Ciphertext, SymmetricDecryptor,
};

use super::{save_output, CommandExecutor};

/// Assemble fragments and perform the final decryption.
///
/// Fragments are numbered from 1 in the order given, or in file-name order
/// when read from a directory. `--order` picks and reorders them by number.
#[derive(Args, Debug)]
pub struct AssembleCommand {
    /// Fragment strings or file paths
    #[arg(short, long, num_args = 1.., conflicts_with = "directory")]
    pub fragments: Option<Vec<String>>,

    /// Directory containing fragment files
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Decryption key (without it the assembled text is printed as is)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Decryption method: xor, aes or auto
    #[arg(short, long, default_value = "auto")]
    pub method: CipherSelector,

    /// Comma-separated 1-based fragment order (e.g. "1,3,2")
    #[arg(long, value_delimiter = ',')]
    pub order: Option<Vec<usize>>,

    /// Save the result to a file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for AssembleCommand {
    fn execute(&self) -> Result<()> {
        let fragments = self.load_fragments()?;
        if fragments.is_empty() {
            bail!("No fragments found");
        }
        println!("Loaded {} fragments", fragments.len());

        let numbered: BTreeMap<usize, String> = fragments
            .into_iter()
            .enumerate()
            .map(|(i, data)| (i + 1, data))
            .collect();
        let assembly = assemble_keyed(&numbered, self.order.as_deref())
            .context("Assembly failed")?;
        println!(
            "Assembled {} fragments ({} characters)",
            assembly.fragment_count, assembly.total_length
        );

        let result = match &self.key {
            Some(key) => match SymmetricDecryptor::new(key)
                .decrypt(Ciphertext::Text(&assembly.text), self.method)
            {
                Ok(decryption) => {
                    println!("Decrypted with {}", decryption.method);
                    decryption.plaintext
                }
                Err(e) => {
                    println!("Warning: Decryption failed ({}), returning assembled data", e);
                    assembly.text
                }
            },
            None => assembly.text,
        };

        println!("\n=== FINAL RESULT ===");
        println!("{}", result);

        if let Some(path) = &self.output {
            save_output(path, &result)?;
        }
        Ok(())
    }
}

impl AssembleCommand {
    /// Directory fragments in name order, or each `-f` value read as a file
    /// when such a file exists and used literally otherwise.
    fn load_fragments(&self) -> Result<Vec<String>> {
        if let Some(dir) = &self.directory {
            let fragments = load_fragments_from_directory(dir)
                .with_context(|| format!("Failed to read fragments from {}", dir.display()))?;
            return Ok(fragments.into_values().collect());
        }

        let Some(values) = &self.fragments else {
            bail!("No fragments provided. Use --fragments or --directory");
        };

        values
            .iter()
            .map(|value| {
                let path = PathBuf::from(value);
                if path.is_file() {
                    fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))
                } else {
                    Ok(value.clone())
                }
            })
            .collect()
    }
}
