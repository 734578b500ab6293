//! LSB plane extraction.
//!
//! - Raster and spiral pixel traversal over red, green and blue planes
//! - Bit stream packing and printable-text recovery

pub mod bitstream;
pub mod image;
pub mod spiral;

pub use bitstream::{is_printable, BitStream, DecodedStream, Termination};
pub use image::{Channel, ChannelPlane, ChannelSelector, ExtractError, LsbExtractor, Traversal};
pub use spiral::{spiral_coordinates, Direction, SpiralIter};
