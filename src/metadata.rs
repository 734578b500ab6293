//! File and image property inspection.
//!
//! PNG `tEXt`, `zTXt` and `iTXt` chunks are collected as well, since text
//! tucked into them is a common place to hide fragments.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use image::io::Reader as ImageReader;
use image::ImageFormat;
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while reading metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to read image: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Failed to read PNG chunks: {0}")]
    PngError(#[from] png::DecodingError),

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProperties {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub size_readable: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageProperties {
    pub format: Option<String>,
    pub color_type: String,
    pub width: u32,
    pub height: u32,
    pub dimensions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub file_properties: FileProperties,
    pub image_properties: ImageProperties,
    /// Text chunk keyword → text.
    pub info: BTreeMap<String, String>,
    /// `keyword: text` for every non-empty text chunk.
    pub potential_hidden_text: Vec<String>,
}

impl Metadata {
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), MetadataError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// `size / 1024` with two decimals, e.g. `"1.50 KB"`.
pub fn readable_size(size_bytes: u64) -> String {
    format!("{:.2} KB", size_bytes as f64 / 1024.0)
}

/// Reads file and image properties of `path`.
pub fn extract_metadata<P: AsRef<Path>>(path: P) -> Result<Metadata, MetadataError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MetadataError::NotFound(path.to_path_buf()));
    }

    let size_bytes = fs::metadata(path)?.len();
    let absolute = fs::canonicalize(path)?;
    let file_properties = FileProperties {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: absolute.display().to_string(),
        size_bytes,
        size_readable: readable_size(size_bytes),
    };

    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let image_format = reader.format();
    let image = reader.decode()?;
    let (width, height) = (image.width(), image.height());
    debug!("Image {}: {:?} {}x{}", path.display(), image_format, width, height);

    let info = if image_format == Some(ImageFormat::Png) {
        read_png_text(path).unwrap_or_else(|e| {
            warn!("Could not read text chunks of {}: {}", path.display(), e);
            BTreeMap::new()
        })
    } else {
        BTreeMap::new()
    };
    let potential_hidden_text = info
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(keyword, text)| format!("{}: {}", keyword, text))
        .collect();

    Ok(Metadata {
        file_properties,
        image_properties: ImageProperties {
            format: image_format.map(|f| format!("{:?}", f).to_uppercase()),
            color_type: format!("{:?}", image.color()),
            width,
            height,
            dimensions: format!("{}x{}", width, height),
        },
        info,
        potential_hidden_text,
    })
}

/// Reads every text chunk of a PNG file, keyword → text.
///
/// Chunks after the image data are included. A compressed chunk that fails
/// to inflate is skipped with a warning.
pub fn read_png_text<P: AsRef<Path>>(
    path: P,
) -> Result<BTreeMap<String, String>, MetadataError> {
    let decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    let mut reader = decoder.read_info()?;
    reader.finish()?;
    let info = reader.info();

    let mut text = BTreeMap::new();
    for chunk in &info.uncompressed_latin1_text {
        text.insert(chunk.keyword.clone(), chunk.text.clone());
    }

    let decoded = info
        .compressed_latin1_text
        .iter()
        .map(|chunk| (&chunk.keyword, chunk.get_text()))
        .chain(info.utf8_text.iter().map(|chunk| (&chunk.keyword, chunk.get_text())));
    for (keyword, result) in decoded {
        match result {
            Ok(value) => {
                text.insert(keyword.clone(), value);
            }
            Err(e) => warn!("Skipping text chunk '{}': {}", keyword, e),
        }
    }

    debug!("Found {} text chunks", text.len());
    Ok(text)
}
