//! End-to-end analysis: extract, decode, assemble, decrypt.
//!
//! [`Analyzer`] does the work in memory. [`run_analysis`] wraps it with the
//! on-disk layout: channel reports, metadata, fragment files, the final flag
//! and the analysis log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::assemble::{assemble, Assembly, Fragment};
use crate::config::AnalysisConfig;
use crate::crypto::{decrypt_final, CipherSelector, Ciphertext, Decryption};
use crate::encoding::auto_detect;
use crate::metadata::{extract_metadata, Metadata};
use crate::report::{render_channel_reports, AnalysisLog, ChannelReport};
use crate::stego::{ChannelSelector, Direction, LsbExtractor, Traversal};

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to create {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Channel reports for one spiral direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpiralReport {
    pub direction: Direction,
    pub channels: Vec<ChannelReport>,
}

/// Everything one analysis produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub metadata: Option<Metadata>,
    /// Raster reports, red, green, blue.
    pub lsb: Vec<ChannelReport>,
    /// Clockwise first.
    pub spiral: Vec<SpiralReport>,
    /// Raw fragments, raster before spiral.
    pub fragments: Vec<Fragment>,
    /// One entry per successful decode of a raw fragment.
    pub decoded_fragments: Vec<Fragment>,
    pub assembly: Option<Assembly>,
    pub final_flag: Option<Decryption>,
}

impl AnalysisReport {
    pub fn flag(&self) -> Option<&str> {
        self.final_flag.as_ref().map(|d| d.plaintext.as_str())
    }
}

/// In-memory analyzer keyed by the decryption key.
#[derive(Debug, Clone)]
pub struct Analyzer {
    key: String,
}

impl Analyzer {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Analyzer keyed by the file stem of `path` (`ghost.png` → `ghost`).
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(image_key(path))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Runs every stage. `metadata` is left empty.
    pub fn analyze(&self, extractor: &LsbExtractor) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        report.lsb = extractor
            .planes(ChannelSelector::All, Traversal::Raster)
            .iter()
            .map(ChannelReport::from_plane)
            .collect();

        report.spiral = Direction::ALL
            .iter()
            .map(|&direction| SpiralReport {
                direction,
                channels: extractor
                    .planes(ChannelSelector::All, Traversal::Spiral(direction))
                    .iter()
                    .map(ChannelReport::from_plane)
                    .collect(),
            })
            .collect();

        report.fragments = collect_fragments(&report);
        report.decoded_fragments = decode_fragments(&report.fragments);
        report.assembly = self.assemble(&report);
        report.final_flag = report
            .assembly
            .as_ref()
            .and_then(|assembly| self.decrypt(assembly));
        report
    }

    fn assemble(&self, report: &AnalysisReport) -> Option<Assembly> {
        let pieces = if report.decoded_fragments.is_empty() {
            &report.fragments
        } else {
            &report.decoded_fragments
        };
        if pieces.is_empty() {
            debug!("No fragments to assemble");
            return None;
        }

        let texts: Vec<&str> = pieces.iter().map(|f| f.data.as_str()).collect();
        match assemble(&texts) {
            Ok(assembly) => Some(assembly),
            Err(e) => {
                warn!("Assembly failed: {}", e);
                None
            }
        }
    }

    fn decrypt(&self, assembly: &Assembly) -> Option<Decryption> {
        match decrypt_final(
            Ciphertext::Text(&assembly.text),
            &self.key,
            CipherSelector::Auto,
        ) {
            Ok(decryption) if decryption.plaintext.is_empty() => {
                warn!("Decryption with key '{}' produced empty output", self.key);
                None
            }
            Ok(decryption) => Some(decryption),
            Err(e) => {
                warn!("Decryption with key '{}' failed: {}", self.key, e);
                None
            }
        }
    }
}

/// File stem of `path`, used as the default decryption key.
pub fn image_key<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn collect_fragments(report: &AnalysisReport) -> Vec<Fragment> {
    report
        .lsb
        .iter()
        .chain(report.spiral.iter().flat_map(|s| s.channels.iter()))
        .filter(|channel| channel.is_fragment())
        .map(|channel| Fragment::new(channel.source.clone(), channel.ascii_text.clone()))
        .collect()
}

fn decode_fragments(fragments: &[Fragment]) -> Vec<Fragment> {
    fragments
        .iter()
        .flat_map(|fragment| {
            auto_detect(&fragment.data)
                .successes()
                .map(|(method, text)| {
                    Fragment::new(fragment.source.clone(), text).with_method(method.as_str())
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn create_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), PipelineError> {
    fs::write(path, contents).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Analyzes the image at `path` and writes every artifact under the
/// configured directories.
///
/// An image that cannot be opened yields empty extraction results rather
/// than an error; only directory and file writes fail the run.
pub fn run_analysis<P: AsRef<Path>>(
    path: P,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, PipelineError> {
    let path = path.as_ref();
    let output_dir = config.output_dir();
    let fragments_dir = config.fragments_dir();
    create_dir(&output_dir)?;
    create_dir(&fragments_dir)?;

    let log_path = config.log_path();
    let log = AnalysisLog::create(&log_path).map_err(|source| PipelineError::Write {
        path: log_path.clone(),
        source,
    })?;

    log.log("Starting metadata extraction...");
    let metadata = match extract_metadata(path) {
        Ok(metadata) => {
            if let Err(e) = metadata.write_json(output_dir.join("metadata.json")) {
                warn!("Failed to write metadata: {}", e);
            }
            log.log("Metadata extraction complete");
            Some(metadata)
        }
        Err(e) => {
            log.log(&format!("Metadata extraction failed: {}", e));
            None
        }
    };

    let analyzer = Analyzer::for_path(path);
    let mut report = match LsbExtractor::from_file(path) {
        Ok(extractor) => analyzer.analyze(&extractor),
        Err(e) => {
            log.log(&format!("Could not load image: {}", e));
            AnalysisReport::default()
        }
    };
    report.metadata = metadata;

    for channel in &report.lsb {
        log.log(&format!(
            "Extracted LSB from {} channel",
            channel.channel.as_str().to_uppercase()
        ));
        write_file(
            &output_dir.join(format!("{}.txt", channel.source)),
            &render_channel_reports(std::slice::from_ref(channel), None),
        )?;
    }

    for spiral in &report.spiral {
        log.log(&format!("Read spiral pattern ({})", spiral.direction));
        let header = format!("Spiral Direction: {}", spiral.direction.display_name());
        write_file(
            &output_dir.join(format!("spiral_{}.txt", spiral.direction)),
            &render_channel_reports(&spiral.channels, Some(&header)),
        )?;
    }

    for fragment in &mut report.fragments {
        let file = fragments_dir.join(format!("fragment_{}.txt", fragment.source));
        write_file(&file, &fragment.data)?;
        log.log(&format!("Fragment saved from {}", fragment.source));
        fragment.file = Some(file);
    }

    for fragment in &mut report.decoded_fragments {
        let method = fragment.method.as_deref().unwrap_or("raw");
        let file = fragments_dir.join(format!("decoded_{}_{}.txt", fragment.source, method));
        write_file(&file, &fragment.data)?;
        log.log(&format!("Decoded {} using {}", fragment.source, method));
        fragment.file = Some(file);
    }

    if let Some(assembly) = &report.assembly {
        log.log(&format!(
            "Assembled {} fragments ({} characters)",
            assembly.fragment_count, assembly.total_length
        ));
        log.log(&format!(
            "Attempting decryption with key: {}",
            analyzer.key()
        ));
    }

    match &report.final_flag {
        Some(decryption) => {
            let flag_path = output_dir.join("final_flag.txt");
            write_file(&flag_path, &decryption.plaintext)?;
            log.log(&format!("Final flag saved to {}", flag_path.display()));
        }
        None => log.log("No flag found"),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::BitStream;
    use image::{DynamicImage, ImageBuffer, Rgb};

    /// Hides `payload` in the red-channel LSBs in raster order.
    fn create_test_image(width: u32, height: u32, payload: &[u8]) -> DynamicImage {
        let bits = BitStream::from_bytes(payload);
        let bits = bits.bits();
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let i = (y * width + x) as usize;
            let bit = bits.get(i).copied().unwrap_or(false) as u8;
            Rgb([0x80 | bit, 0x40, 0x20])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_image_key() {
        assert_eq!(image_key("images/ghost.png"), "ghost");
        assert_eq!(image_key("ghost"), "ghost");
    }

    /// `flag` XORed with a backtick maps uppercase and `_` to punctuation
    /// and digits, so no text decoder applies to the hidden fragment.
    fn hidden_payload(flag: &[u8]) -> Vec<u8> {
        let mut payload: Vec<u8> = flag.iter().map(|b| b ^ b'`').collect();
        payload.push(0);
        payload
    }

    #[test]
    fn test_analyze_red_channel_flag() {
        let image = create_test_image(32, 32, &hidden_payload(b"FLAG_HIDDEN_IN_RED"));
        let report = Analyzer::new("`").analyze(&LsbExtractor::from_image(&image));

        assert_eq!(report.lsb.len(), 3);
        assert_eq!(report.spiral.len(), 2);
        assert_eq!(report.spiral[0].direction, Direction::Clockwise);
        assert!(!report.lsb[0].possibly_corrupted);

        assert_eq!(report.fragments.len(), 1);
        assert_eq!(report.fragments[0].source, "lsb_red");
        assert!(report.decoded_fragments.is_empty());
        assert_eq!(report.assembly.as_ref().unwrap().fragment_count, 1);
        assert_eq!(report.flag(), Some("FLAG_HIDDEN_IN_RED"));
        assert_eq!(
            report.final_flag.as_ref().unwrap().method,
            crate::crypto::CipherMethod::Xor
        );
    }

    #[test]
    fn test_decoded_fragments_carry_method() {
        let fragments = vec![Fragment::new("lsb_red", "U0dWc2JHOGdWMjl5YkdRPQ==")];
        let decoded = decode_fragments(&fragments);
        assert!(decoded
            .iter()
            .any(|f| f.method.as_deref() == Some("base64") && f.data == "SGVsbG8gV29ybGQ="));
        assert!(decoded.iter().all(|f| f.source == "lsb_red"));
    }

    #[test]
    fn test_analyze_blank_image() {
        let image = create_test_image(8, 8, &[]);
        let report = Analyzer::new("ghost").analyze(&LsbExtractor::from_image(&image));
        assert!(report.fragments.is_empty());
        assert!(report.assembly.is_none());
        assert!(report.flag().is_none());
    }

    #[test]
    fn test_empty_plaintext_is_not_a_flag() {
        // Whitespace decodes as empty base64, so every cipher yields nothing.
        let assembly = assemble(&["           "]).unwrap();
        let raw = decrypt_final(
            Ciphertext::Text(&assembly.text),
            "ghost",
            CipherSelector::Auto,
        )
        .unwrap();
        assert!(raw.plaintext.is_empty());
        assert!(Analyzer::new("ghost").decrypt(&assembly).is_none());
    }

    #[test]
    fn test_run_analysis_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("`.png");
        create_test_image(24, 24, &hidden_payload(b"FLAG_ON_DISK"))
            .save(&image_path)
            .unwrap();

        let config = AnalysisConfig {
            output_directory: dir.path().join("out").display().to_string(),
            fragments_directory: dir.path().join("frags").display().to_string(),
            ..AnalysisConfig::default()
        };
        let report = run_analysis(&image_path, &config).unwrap();

        let out = dir.path().join("out");
        assert!(out.join("metadata.json").exists());
        assert!(out.join("spiral_clockwise.txt").exists());
        assert!(out.join("spiral_counterclockwise.txt").exists());
        assert!(report.metadata.is_some());
        assert!(report.fragments.iter().all(|f| f.file.is_some()));

        let red = fs::read_to_string(out.join("lsb_red.txt")).unwrap();
        assert!(red.contains("=== RED CHANNEL ==="));
        assert!(dir.path().join("frags").join("fragment_lsb_red.txt").exists());
        assert_eq!(
            fs::read_to_string(out.join("final_flag.txt")).unwrap(),
            "FLAG_ON_DISK"
        );

        let log = fs::read_to_string(out.join("analysis.log")).unwrap();
        assert!(log.lines().next().unwrap().ends_with("Starting metadata extraction..."));
        assert!(log.contains("Attempting decryption with key: `"));
    }

    #[test]
    fn test_run_analysis_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("broken.png");
        fs::write(&image_path, b"not an image").unwrap();

        let config = AnalysisConfig {
            output_directory: dir.path().join("out").display().to_string(),
            fragments_directory: dir.path().join("frags").display().to_string(),
            ..AnalysisConfig::default()
        };
        let report = run_analysis(&image_path, &config).unwrap();
        assert!(report.lsb.is_empty());
        assert!(report.flag().is_none());

        let log = fs::read_to_string(dir.path().join("out").join("analysis.log")).unwrap();
        assert!(log.contains("No flag found"));
    }
}
