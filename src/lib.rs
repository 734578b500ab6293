//! # Ghostsift - recover text hidden in image pixels
//!
//! Ghostsift pulls least-significant-bit planes out of an image, peels text
//! encodings off whatever it finds, stitches the pieces together and tries a
//! final symmetric decryption.
//!
//! ## Overview
//!
//! - Each red, green and blue plane is read in raster order and along a
//!   square spiral from the image center (clockwise and counterclockwise)
//! - LSB bits are packed MSB-first into bytes and cut at the first null
//! - Printable runs longer than ten characters become **fragments**
//! - Fragments are speculatively decoded (base64, ROT-13 and both orders)
//! - Decoded fragments are concatenated and decrypted with XOR or AES-CBC,
//!   using the image file stem as the key
//!
//! ## Example Usage
//!
//! ```rust
//! use ghostsift::stego::{spiral_coordinates, Direction};
//!
//! let coords = spiral_coordinates(3, 3, Direction::Clockwise);
//! assert_eq!(coords[0], (1, 1));
//! assert_eq!(coords.len(), 9);
//! ```
//!
//! ```rust
//! use ghostsift::encoding::auto_detect;
//!
//! let detection = auto_detect("SGVsbG8=");
//! assert_eq!(detection.first().map(|(_, text)| text), Some("Hello"));
//! ```
//!
//! ## Modules
//!
//! - [`stego`]: LSB plane extraction, spiral traversal, bit stream decoding
//! - [`encoding`]: Base64 and ROT-13 layers, auto-detection
//! - [`assemble`]: Fragment concatenation
//! - [`crypto`]: XOR and AES-CBC final decryption
//! - [`metadata`]: File and image properties
//! - [`pipeline`]: The full analysis run

pub mod assemble;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod stego;

// Re-export commonly used types at the crate root
pub use assemble::{
    assemble, assemble_keyed, load_fragments_from_directory, Assembly, AssemblyError, Fragment,
};
pub use config::{AnalysisConfig, ConfigError};
pub use crypto::{
    decrypt_final, CipherMethod, CipherSelector, Ciphertext, DecryptError, Decryption,
    SymmetricDecryptor,
};
pub use encoding::{auto_detect, decode_chain, DecodeError, DetectMethod, Detection, Encoding};
pub use metadata::{extract_metadata, Metadata, MetadataError};
pub use pipeline::{run_analysis, AnalysisReport, Analyzer, PipelineError};
pub use report::{AnalysisLog, ChannelReport, MIN_FRAGMENT_LEN};
pub use stego::{
    BitStream, Channel, ChannelSelector, Direction, ExtractError, LsbExtractor, Termination,
    Traversal,
};
