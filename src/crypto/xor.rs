//! Repeating-key XOR.
//!
//! Self-inverse and unauthenticated: any key "decrypts" any data, so a wrong
//! key can only be spotted by looking at the output.

use super::symmetric::DecryptError;

/// XORs `data` with `key` repeated to cover its length.
pub fn xor_decrypt(data: &[u8], key: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if key.is_empty() {
        return Err(DecryptError::EmptyKey);
    }

    Ok(data
        .iter()
        .zip(key.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_known_flag() {
        let ciphertext = xor_decrypt(b"FLAG{test}", b"k").unwrap();
        assert_ne!(ciphertext, b"FLAG{test}");
        assert_eq!(xor_decrypt(&ciphertext, b"k").unwrap(), b"FLAG{test}");
    }

    #[test]
    fn test_xor_self_inverse() {
        let data: Vec<u8> = (0..=255).collect();
        for key in [&b"k"[..], &b"ghost"[..], &b"a much longer key than the data it covers"[..]] {
            let once = xor_decrypt(&data, key).unwrap();
            assert_eq!(xor_decrypt(&once, key).unwrap(), data);
        }
    }

    #[test]
    fn test_xor_key_repeats() {
        let out = xor_decrypt(&[0, 0, 0, 0, 0], b"ab").unwrap();
        assert_eq!(out, b"ababa");
    }

    #[test]
    fn test_xor_empty_data() {
        assert!(xor_decrypt(&[], b"key").unwrap().is_empty());
    }

    #[test]
    fn test_xor_empty_key() {
        assert!(matches!(xor_decrypt(b"data", b""), Err(DecryptError::EmptyKey)));
    }
}
