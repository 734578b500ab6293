//! LSB (Least Significant Bit) extraction from image color planes.
//!
//! Reads `value & 1` of one color channel for every pixel, either in raster
//! order (rows top to bottom, columns left to right) or along a spiral from
//! the image center. Each channel is extracted independently.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{DynamicImage, GenericImageView, RgbImage};
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use super::bitstream::BitStream;
use super::spiral::{Direction, SpiralIter};

/// Errors that can occur while loading an image or parsing selectors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File {0} not found")]
    NotFound(PathBuf),

    #[error("Image load error: {0}")]
    ImageLoadError(String),

    #[error("Invalid channel '{0}' (expected red, green, blue or all)")]
    InvalidChannel(String),

    #[error("Invalid direction '{0}' (expected clockwise or counterclockwise)")]
    InvalidDirection(String),
}

/// A color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All channels, in reporting order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Index of the channel in an RGB pixel.
    pub fn index(&self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            _ => Err(ExtractError::InvalidChannel(s.to_string())),
        }
    }
}

/// Which channels to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelSelector {
    Single(Channel),
    #[default]
    All,
}

impl ChannelSelector {
    pub fn channels(&self) -> Vec<Channel> {
        match self {
            ChannelSelector::Single(channel) => vec![*channel],
            ChannelSelector::All => Channel::ALL.to_vec(),
        }
    }
}

impl FromStr for ChannelSelector {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(ChannelSelector::All);
        }
        s.parse().map(ChannelSelector::Single)
    }
}

/// Pixel visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Traversal {
    Raster,
    Spiral(Direction),
}

impl Traversal {
    /// Provenance label: `lsb` or `spiral_<direction>`.
    pub fn label(&self) -> String {
        match self {
            Traversal::Raster => "lsb".to_string(),
            Traversal::Spiral(direction) => format!("spiral_{}", direction),
        }
    }
}

/// The bits extracted from one channel under one traversal.
#[derive(Debug, Clone)]
pub struct ChannelPlane {
    pub channel: Channel,
    pub traversal: Traversal,
    pub bits: BitStream,
}

impl ChannelPlane {
    /// Provenance tag, e.g. `lsb_red` or `spiral_clockwise_blue`.
    pub fn source(&self) -> String {
        format!("{}_{}", self.traversal.label(), self.channel)
    }
}

/// LSB plane extractor over a loaded image.
pub struct LsbExtractor {
    width: u32,
    height: u32,
    /// `None` when the image has no color channels.
    rgb: Option<RgbImage>,
}

impl LsbExtractor {
    /// Loads an image from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }
        let image = image::open(path).map_err(|e| ExtractError::ImageLoadError(e.to_string()))?;
        Ok(Self::from_image(&image))
    }

    /// Loads an image from encoded bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ExtractError::ImageLoadError(e.to_string()))?;
        Ok(Self::from_image(&image))
    }

    /// Creates an extractor from a decoded image. The image is not modified.
    pub fn from_image(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let rgb = image.color().has_color().then(|| image.to_rgb8());
        Self { width, height, rgb }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns true if red, green and blue planes exist.
    pub fn has_color(&self) -> bool {
        self.rgb.is_some()
    }

    /// Extracts one channel along the given traversal.
    ///
    /// Returns `None` (with a warning) if the image lacks the channel.
    pub fn plane(&self, channel: Channel, traversal: Traversal) -> Option<ChannelPlane> {
        let Some(rgb) = &self.rgb else {
            warn!("Image has no {} channel, skipping", channel);
            return None;
        };

        let index = channel.index();
        let lsb = |(x, y): (u32, u32)| rgb.get_pixel(x, y).0[index] & 1 == 1;

        let mut bits = BitStream::with_capacity(self.pixel_count());
        match traversal {
            Traversal::Raster => {
                for y in 0..self.height {
                    for x in 0..self.width {
                        bits.push(lsb((x, y)));
                    }
                }
            }
            Traversal::Spiral(direction) => {
                for coord in SpiralIter::new(self.width, self.height, direction) {
                    bits.push(lsb(coord));
                }
            }
        }

        debug!(
            "Extracted {} bits from {} channel ({})",
            bits.len(),
            channel,
            traversal.label()
        );

        Some(ChannelPlane {
            channel,
            traversal,
            bits,
        })
    }

    /// Extracts every selected channel, in red, green, blue order.
    pub fn planes(&self, selector: ChannelSelector, traversal: Traversal) -> Vec<ChannelPlane> {
        selector
            .channels()
            .into_iter()
            .filter_map(|channel| self.plane(channel, traversal))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 17) % 256) as u8,
                ((y * 23) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_raster_bit_count_matches_pixels() {
        let extractor = LsbExtractor::from_image(&create_test_image(13, 7));
        let planes = extractor.planes(ChannelSelector::All, Traversal::Raster);

        assert_eq!(planes.len(), 3);
        for plane in &planes {
            assert_eq!(plane.bits.len(), 13 * 7);
        }
    }

    #[test]
    fn test_raster_order_is_row_major() {
        // Red LSB is 1 only at (1, 0) and (0, 1).
        let img = ImageBuffer::from_fn(2, 2, |x, y| {
            let red = if (x, y) == (1, 0) || (x, y) == (0, 1) { 1 } else { 0 };
            Rgb([red, 0, 0])
        });
        let extractor = LsbExtractor::from_image(&DynamicImage::ImageRgb8(img));
        let plane = extractor.plane(Channel::Red, Traversal::Raster).unwrap();

        assert_eq!(plane.bits.bits(), &[false, true, true, false]);
    }

    #[test]
    fn test_spiral_bit_count_matches_pixels() {
        let extractor = LsbExtractor::from_image(&create_test_image(9, 4));
        for direction in Direction::ALL {
            let plane = extractor
                .plane(Channel::Green, Traversal::Spiral(direction))
                .unwrap();
            assert_eq!(plane.bits.len(), 36);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let img = ImageBuffer::from_fn(4, 1, |_, _| Rgb([1u8, 0, 1]));
        let extractor = LsbExtractor::from_image(&DynamicImage::ImageRgb8(img));

        let red = extractor.plane(Channel::Red, Traversal::Raster).unwrap();
        let green = extractor.plane(Channel::Green, Traversal::Raster).unwrap();
        assert!(red.bits.bits().iter().all(|&b| b));
        assert!(green.bits.bits().iter().all(|&b| !b));
    }

    #[test]
    fn test_grayscale_channels_skipped() {
        let img = ImageBuffer::from_fn(4, 4, |x, _| Luma([x as u8]));
        let extractor = LsbExtractor::from_image(&DynamicImage::ImageLuma8(img));

        assert!(!extractor.has_color());
        assert!(extractor.planes(ChannelSelector::All, Traversal::Raster).is_empty());
    }

    #[test]
    fn test_source_labels() {
        let extractor = LsbExtractor::from_image(&create_test_image(2, 2));
        let raster = extractor.plane(Channel::Red, Traversal::Raster).unwrap();
        let spiral = extractor
            .plane(Channel::Blue, Traversal::Spiral(Direction::Counterclockwise))
            .unwrap();

        assert_eq!(raster.source(), "lsb_red");
        assert_eq!(spiral.source(), "spiral_counterclockwise_blue");
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!("all".parse::<ChannelSelector>().unwrap(), ChannelSelector::All);
        assert_eq!(
            "Blue".parse::<ChannelSelector>().unwrap(),
            ChannelSelector::Single(Channel::Blue)
        );
        assert!(matches!(
            "alpha".parse::<ChannelSelector>(),
            Err(ExtractError::InvalidChannel(_))
        ));
        assert_eq!(ChannelSelector::default(), ChannelSelector::All);
    }

    #[test]
    fn test_missing_file() {
        let result = LsbExtractor::from_file("/nonexistent/ghost.png");
        assert!(matches!(result, Err(ExtractError::NotFound(_))));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = LsbExtractor::from_bytes(b"not an image");
        assert!(matches!(result, Err(ExtractError::ImageLoadError(_))));
    }
}
