//! Bit stream packing and ASCII recovery.
//!
//! Bits are packed 8 at a time, most significant bit first. An incomplete
//! trailing byte is always dropped. The first `0x00` byte terminates the text.

use log::warn;
use serde::Serialize;

/// Number of bits shown by [`BitStream::preview`] in reports.
pub const PREVIEW_BITS: usize = 100;

/// Ordered sequence of single bits.
///
/// The order is fixed by the traversal that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bits: Vec<bool>,
}

impl BitStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Expands bytes into bits, most significant bit first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        bytes
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
            .collect()
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Packs complete bytes; trailing bits that do not fill a byte are dropped.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.chunks_exact(8).map(pack_byte).collect()
    }

    /// Leading bits as a `0`/`1` string, suffixed with `...` when truncated.
    pub fn preview(&self, limit: usize) -> String {
        let mut out: String = self
            .bits
            .iter()
            .take(limit)
            .map(|&b| if b { '1' } else { '0' })
            .collect();
        if self.bits.len() > limit {
            out.push_str("...");
        }
        out
    }

    /// Converts the stream to bytes and printable text.
    pub fn decode(&self, termination: Termination) -> DecodedStream {
        let mut bytes = Vec::with_capacity(self.bits.len() / 8);
        let mut ascii_text = String::new();
        let mut possibly_corrupted = false;

        for chunk in self.bits.chunks_exact(8) {
            let byte = pack_byte(chunk);
            bytes.push(byte);

            if byte == 0 {
                break;
            }
            if is_printable(byte) {
                ascii_text.push(byte as char);
            } else if termination == Termination::Strict {
                possibly_corrupted = true;
            }
        }

        if possibly_corrupted {
            warn!(
                "Stream may contain corrupted or binary data ({} bytes read)",
                bytes.len()
            );
        }

        DecodedStream {
            total_bits: self.bits.len(),
            total_bytes: bytes.len(),
            bytes,
            ascii_text,
            possibly_corrupted,
        }
    }
}

impl FromIterator<bool> for BitStream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

fn pack_byte(bits: &[bool]) -> u8 {
    bits.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8)
}

/// Printable ASCII plus tab, newline and carriage return.
pub fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte) || matches!(byte, 9 | 10 | 13)
}

/// Termination discipline for text recovery.
///
/// Both stop at the first null byte and drop non-printable bytes from the
/// text. `Strict` additionally reports those bytes as possible corruption;
/// `Tolerant` skips them silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Raster extraction.
    Strict,
    /// Spiral extraction.
    Tolerant,
}

/// Result of converting a [`BitStream`] to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedStream {
    /// Bytes read, up to and including the terminating null byte.
    pub bytes: Vec<u8>,
    /// Printable characters among `bytes`.
    pub ascii_text: String,
    /// Set when a non-printable byte was seen before termination (Strict only).
    pub possibly_corrupted: bool,
    pub total_bits: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packs_msb_first() {
        let stream: BitStream = [false, true, false, false, false, false, false, true]
            .into_iter()
            .collect();
        assert_eq!(stream.to_bytes(), vec![b'A']);
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let stream = BitStream::from_bytes(b"FLAG");
        assert_eq!(stream.len(), 32);
        assert_eq!(stream.to_bytes(), b"FLAG");
    }

    #[test]
    fn test_trailing_bits_dropped() {
        let mut stream = BitStream::from_bytes(b"Hi");
        stream.push(true);
        stream.push(false);
        stream.push(true);

        let decoded = stream.decode(Termination::Tolerant);
        assert_eq!(decoded.ascii_text, "Hi");
        assert_eq!(decoded.total_bits, 19);
        assert_eq!(decoded.total_bytes, 2);
    }

    #[test]
    fn test_stops_at_null() {
        let stream = BitStream::from_bytes(b"secret\0garbage");
        let decoded = stream.decode(Termination::Strict);
        assert_eq!(decoded.ascii_text, "secret");
        assert_eq!(decoded.total_bytes, 7);
        assert!(!decoded.possibly_corrupted);
    }

    #[test]
    fn test_strict_flags_non_printable_but_continues() {
        let stream = BitStream::from_bytes(&[b'a', 0x01, b'b', 0xFF, b'c']);
        let decoded = stream.decode(Termination::Strict);
        assert_eq!(decoded.ascii_text, "abc");
        assert!(decoded.possibly_corrupted);
        assert_eq!(decoded.total_bytes, 5);
    }

    #[test]
    fn test_tolerant_does_not_flag() {
        let stream = BitStream::from_bytes(&[b'a', 0x01, b'b']);
        let decoded = stream.decode(Termination::Tolerant);
        assert_eq!(decoded.ascii_text, "ab");
        assert!(!decoded.possibly_corrupted);
    }

    #[test]
    fn test_whitespace_controls_are_printable() {
        let stream = BitStream::from_bytes(b"a\tb\r\nc");
        let decoded = stream.decode(Termination::Strict);
        assert_eq!(decoded.ascii_text, "a\tb\r\nc");
        assert!(!decoded.possibly_corrupted);
    }

    #[test]
    fn test_empty_stream() {
        let decoded = BitStream::new().decode(Termination::Strict);
        assert!(decoded.bytes.is_empty());
        assert!(decoded.ascii_text.is_empty());
        assert_eq!(decoded.total_bits, 0);
    }

    #[test]
    fn test_preview_truncates() {
        let stream = BitStream::from_bytes(&[0xF0; 20]);
        let preview = stream.preview(PREVIEW_BITS);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), PREVIEW_BITS + 3);
        assert!(preview.starts_with("11110000"));
    }
}
