//! Integration tests for Ghostsift
//!
//! Images are built in memory with payloads hidden in channel LSBs, then
//! recovered through the public API.

use std::collections::{BTreeMap, HashSet};
use std::fs;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb};

use ghostsift::crypto::xor_decrypt;
use ghostsift::encoding::{decode_base64, decode_chain_named, decode_rot13};
use ghostsift::stego::spiral_coordinates;
use ghostsift::{
    assemble_keyed, auto_detect, decrypt_final, run_analysis, AnalysisConfig, Analyzer, BitStream,
    Channel, ChannelSelector, CipherSelector, Ciphertext, DetectMethod, Direction, LsbExtractor,
    Termination, Traversal,
};

/// Hides `payload` in one channel's LSBs in raster order; other LSBs are zero.
fn create_test_image(width: u32, height: u32, channel: Channel, payload: &[u8]) -> DynamicImage {
    let stream = BitStream::from_bytes(payload);
    let bits = stream.bits();
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let bit = bits.get((y * width + x) as usize).copied().unwrap_or(false) as u8;
        let mut px = [0xA0u8, 0x50, 0x28];
        px[channel.index()] |= bit;
        Rgb(px)
    });
    DynamicImage::ImageRgb8(img)
}

fn with_null(text: &[u8]) -> Vec<u8> {
    let mut payload = text.to_vec();
    payload.push(0);
    payload
}

/// Raster extraction yields one bit per pixel for every channel
#[test]
fn test_raster_bit_count_matches_pixels() {
    for (w, h) in [(1, 1), (5, 3), (16, 9), (2, 31)] {
        let image = create_test_image(w, h, Channel::Red, &[]);
        let extractor = LsbExtractor::from_image(&image);
        let planes = extractor.planes(ChannelSelector::All, Traversal::Raster);
        assert_eq!(planes.len(), 3);
        for plane in planes {
            assert_eq!(plane.bits.len(), (w * h) as usize);
        }
    }
}

/// Grayscale images have no color planes; they are skipped, not an error
#[test]
fn test_grayscale_channels_skipped() {
    let gray: GrayImage = ImageBuffer::from_fn(4, 4, |x, _| Luma([x as u8]));
    let extractor = LsbExtractor::from_image(&DynamicImage::ImageLuma8(gray));
    assert!(extractor
        .planes(ChannelSelector::All, Traversal::Raster)
        .is_empty());
}

/// Spiral traversal is a permutation of every coordinate
#[test]
fn test_spiral_visits_every_pixel_once() {
    for w in 0..=9u32 {
        for h in 0..=9u32 {
            for direction in Direction::ALL {
                let coords = spiral_coordinates(w, h, direction);
                assert_eq!(coords.len(), (w * h) as usize, "{}x{} {}", w, h, direction);
                let unique: HashSet<_> = coords.iter().copied().collect();
                assert_eq!(unique.len(), coords.len());
                assert!(coords.iter().all(|&(x, y)| x < w && y < h));
            }
        }
    }
}

/// Text hidden in the red channel reads back through the strict decoder
#[test]
fn test_red_channel_hello_autodetect() {
    let image = create_test_image(10, 10, Channel::Red, &with_null(b"SGVsbG8="));
    let plane = LsbExtractor::from_image(&image)
        .plane(Channel::Red, Traversal::Raster)
        .unwrap();
    let decoded = plane.bits.decode(Termination::Strict);

    assert_eq!(decoded.ascii_text, "SGVsbG8=");
    assert!(!decoded.possibly_corrupted);

    let detection = auto_detect(&decoded.ascii_text);
    assert_eq!(detection.get(DetectMethod::Base64), Some("Hello"));
}

/// Base64 round trip through the decoding layer
#[test]
fn test_base64_roundtrip() {
    for text in ["", "FLAG{x}", "multi\nline", "ünïcödé ✓"] {
        assert_eq!(decode_base64(&BASE64.encode(text)).unwrap(), text);
    }
}

/// ROT-13 is an involution
#[test]
fn test_rot13_involution() {
    let text = "TheQuickBrownFoxJumpsOverTheLazyDog";
    assert_eq!(decode_rot13(&decode_rot13(text)), text);
}

/// A single base64 layer matches plain base64 decoding
#[test]
fn test_single_layer_chain() {
    let encoded = BASE64.encode("layered");
    assert_eq!(
        decode_chain_named(&encoded, &["base64"]).unwrap(),
        decode_base64(&encoded).unwrap()
    );
}

/// Unknown layers pass the value through
#[test]
fn test_chain_skips_unknown_layer() {
    let encoded = BASE64.encode(decode_rot13("FLAG{layers}"));
    let decoded = decode_chain_named(&encoded, &["base64", "unknownlayer", "rot13"]).unwrap();
    assert_eq!(decoded, "FLAG{layers}");
}

/// Keyed assembly honors explicit order and defaults to key order
#[test]
fn test_keyed_assembly_order() {
    let fragments = BTreeMap::from([(2, "A".to_string()), (1, "B".to_string())]);
    assert_eq!(assemble_keyed(&fragments, Some(&[1, 2][..])).unwrap().text, "BA");
    assert_eq!(assemble_keyed(&fragments, None).unwrap().text, "BA");
}

/// XOR ciphertext decrypts with the same key
#[test]
fn test_xor_flag_decrypt() {
    let ciphertext = xor_decrypt(b"FLAG{test}", b"k").unwrap();
    let result = decrypt_final(Ciphertext::Bytes(&ciphertext), "k", CipherSelector::Xor).unwrap();
    assert_eq!(result.plaintext, "FLAG{test}");
    assert_eq!(xor_decrypt(&ciphertext, b"k").unwrap(), b"FLAG{test}");
}

/// Full in-memory analysis recovers a flag hidden in the red channel
#[test]
fn test_analyzer_recovers_red_flag() {
    // XOR with a backtick maps uppercase and '_' to punctuation and digits.
    let hidden: Vec<u8> = b"FLAG_RED_CHANNEL".iter().map(|b| b ^ b'`').collect();
    let image = create_test_image(40, 40, Channel::Red, &with_null(&hidden));

    let report = Analyzer::new("`").analyze(&LsbExtractor::from_image(&image));
    assert_eq!(report.fragments.len(), 1);
    assert_eq!(report.fragments[0].source, "lsb_red");
    assert_eq!(report.flag(), Some("FLAG_RED_CHANNEL"));
}

/// Fragments encoded with base64 are decoded before assembly
#[test]
fn test_analyzer_decodes_base64_fragment() {
    let encoded = BASE64.encode("an assembled secret");
    let image = create_test_image(40, 40, Channel::Green, &with_null(encoded.as_bytes()));

    let report = Analyzer::new("key").analyze(&LsbExtractor::from_image(&image));
    assert_eq!(report.fragments[0].source, "lsb_green");
    assert!(report
        .decoded_fragments
        .iter()
        .any(|f| f.method.as_deref() == Some("base64") && f.data == "an assembled secret"));
    assert!(report.assembly.is_some());
}

/// File-based run writes every artifact and the final flag
#[test]
fn test_run_analysis_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("`.png");
    let hidden: Vec<u8> = b"FLAG_FROM_FILE".iter().map(|b| b ^ b'`').collect();
    create_test_image(32, 32, Channel::Red, &with_null(&hidden))
        .save(&image_path)
        .unwrap();

    let config = AnalysisConfig {
        output_directory: dir.path().join("output").display().to_string(),
        fragments_directory: dir.path().join("fragments").display().to_string(),
        ..AnalysisConfig::default()
    };
    let report = run_analysis(&image_path, &config).unwrap();
    assert_eq!(report.flag(), Some("FLAG_FROM_FILE"));

    let output = dir.path().join("output");
    for name in [
        "lsb_red.txt",
        "lsb_green.txt",
        "lsb_blue.txt",
        "spiral_clockwise.txt",
        "spiral_counterclockwise.txt",
        "metadata.json",
        "analysis.log",
    ] {
        assert!(output.join(name).exists(), "missing {}", name);
    }
    assert_eq!(
        fs::read_to_string(output.join("final_flag.txt")).unwrap(),
        "FLAG_FROM_FILE"
    );
    assert!(dir
        .path()
        .join("fragments")
        .join("fragment_lsb_red.txt")
        .exists());

    let spiral = fs::read_to_string(output.join("spiral_counterclockwise.txt")).unwrap();
    assert!(spiral.starts_with("Spiral Direction: Counter-clockwise"));

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["image_properties"]["dimensions"], "32x32");
}

/// A missing image reports "no flag found" instead of failing
#[test]
fn test_run_analysis_missing_image() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalysisConfig {
        output_directory: dir.path().join("output").display().to_string(),
        fragments_directory: dir.path().join("fragments").display().to_string(),
        ..AnalysisConfig::default()
    };
    let report = run_analysis(dir.path().join("absent.png"), &config).unwrap();
    assert!(report.metadata.is_none());
    assert!(report.fragments.is_empty());
    assert!(report.flag().is_none());
}
