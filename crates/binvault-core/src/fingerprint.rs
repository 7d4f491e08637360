//! Composite content fingerprint for deduplication.
//!
//! A fingerprint pairs a cheap 32-bit CRC with a 128-bit truncation of the
//! BLAKE3 digest, split into two u64 halves. Equal fingerprints are treated
//! as identical content; the cryptographic component carries the confidence.

use serde::{Deserialize, Serialize};

/// Composite content hash computed over exact object bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// CRC32 of the content (non-cryptographic component).
    pub hash32: u32,
    /// First 8 bytes of the BLAKE3 digest, little-endian.
    pub crypto_a: u64,
    /// Second 8 bytes of the BLAKE3 digest, little-endian.
    pub crypto_b: u64,
}

/// Computes the composite fingerprint of `data`.
///
/// Pure function of content only: no side effects and no failure mode.
/// Hash state is constructed per call, so repeated use cannot leak state
/// between objects.
pub fn fingerprint(data: &[u8]) -> Fingerprint {
    let mut crc = crc32fast::Hasher::new();
    crc.update(data);

    let digest = blake3::hash(data);
    let bytes = digest.as_bytes();
    let mut a = [0u8; 8];
    let mut b = [0u8; 8];
    a.copy_from_slice(&bytes[0..8]);
    b.copy_from_slice(&bytes[8..16]);

    Fingerprint {
        hash32: crc.finalize(),
        crypto_a: u64::from_le_bytes(a),
        crypto_b: u64::from_le_bytes(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let fp1 = fingerprint(b"hello binvault");
        let fp2 = fingerprint(b"hello binvault");
        assert_eq!(fp1, fp2);
    }

    #[test]
    fn test_distinct_content_distinct_fingerprint() {
        let fp1 = fingerprint(b"payload one");
        let fp2 = fingerprint(b"payload two");
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn test_empty_input() {
        let fp = fingerprint(b"");
        // CRC32 of the empty string is 0; the BLAKE3 halves are not.
        assert_eq!(fp.hash32, 0);
        assert_ne!(fp.crypto_a, 0);
        assert_ne!(fp.crypto_b, 0);
    }

    #[test]
    fn test_no_cross_contamination() {
        let reference = fingerprint(b"bbb");
        let _ = fingerprint(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(fingerprint(b"bbb"), reference);
    }

    #[test]
    fn test_single_bit_flip_changes_crypto_halves() {
        let fp1 = fingerprint(&[0u8; 64]);
        let mut flipped = [0u8; 64];
        flipped[63] = 1;
        let fp2 = fingerprint(&flipped);
        assert_ne!(fp1.crypto_a, fp2.crypto_a);
        assert_ne!(fp1.crypto_b, fp2.crypto_b);
    }
}
