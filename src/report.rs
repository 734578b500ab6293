//! Analysis log file and per-channel extraction reports.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;

use crate::encoding::{decode_base64, looks_like_base64};
use crate::stego::bitstream::PREVIEW_BITS;
use crate::stego::{Channel, ChannelPlane, Termination, Traversal};

/// ASCII text must be longer than this to count as a fragment.
pub const MIN_FRAGMENT_LEN: usize = 10;

/// Formats one log line: `[YYYY-MM-DD HH:MM:SS] message`.
pub fn format_log_line(timestamp: &DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", timestamp.format("%Y-%m-%d %H:%M:%S"), message)
}

/// Append-only analysis log.
///
/// Every message also goes to the `log` facade at info level.
#[derive(Debug, Clone)]
pub struct AnalysisLog {
    path: PathBuf,
}

impl AnalysisLog {
    /// Starts a fresh log at `path`, truncating any previous run.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn log(&self, message: &str) {
        info!("{}", message);

        let line = format_log_line(&Local::now(), message);
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = written {
            warn!("Failed to write log file {}: {}", self.path.display(), e);
        }
    }
}

/// Summary of one extracted channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub source: String,
    pub total_bits: usize,
    pub total_bytes: usize,
    /// First bits as a `0`/`1` string.
    pub binary: String,
    pub ascii_text: String,
    pub possibly_corrupted: bool,
    /// Raster only: base64 decoding of `ascii_text` when it looks like base64.
    pub base64_decoded: Option<String>,
}

impl ChannelReport {
    /// Decodes a plane with the discipline matching its traversal.
    pub fn from_plane(plane: &ChannelPlane) -> Self {
        let termination = match plane.traversal {
            Traversal::Raster => Termination::Strict,
            Traversal::Spiral(_) => Termination::Tolerant,
        };
        let decoded = plane.bits.decode(termination);

        let base64_decoded = match plane.traversal {
            Traversal::Raster => peek_base64(&decoded.ascii_text),
            Traversal::Spiral(_) => None,
        };

        Self {
            channel: plane.channel,
            source: plane.source(),
            total_bits: decoded.total_bits,
            total_bytes: decoded.total_bytes,
            binary: plane.bits.preview(PREVIEW_BITS),
            ascii_text: decoded.ascii_text,
            possibly_corrupted: decoded.possibly_corrupted,
            base64_decoded,
        }
    }

    /// Returns true if the text is long enough to keep as a fragment.
    pub fn is_fragment(&self) -> bool {
        self.ascii_text.chars().count() > MIN_FRAGMENT_LEN
    }
}

fn peek_base64(text: &str) -> Option<String> {
    if text.chars().count() <= MIN_FRAGMENT_LEN || !looks_like_base64(text) {
        return None;
    }
    decode_base64(text).ok()
}

/// Renders channel reports in the plain-text report layout.
///
/// `header` is written first when given (e.g. the spiral direction line).
pub fn render_channel_reports(reports: &[ChannelReport], header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        out.push_str(header);
        out.push('\n');
    }
    for report in reports {
        out.push_str(&format!(
            "\n=== {} CHANNEL ===\n",
            report.channel.as_str().to_uppercase()
        ));
        out.push_str(&format!("Total bits: {}\n", report.total_bits));
        out.push_str(&format!("Total bytes: {}\n", report.total_bytes));
        if !report.ascii_text.is_empty() {
            out.push_str(&format!("\nASCII Text:\n{}\n", report.ascii_text));
        }
        if let Some(decoded) = &report.base64_decoded {
            out.push_str(&format!("\nBase64 Decoded:\n{}\n", decoded));
        }
    }
    out
}
