//! Opaque key codec.
//!
//! An opaque key packs `(id, partition, offset)` into a single reversible
//! text token: the partition and offset are combined into one 64-bit
//! location word, the `(id, location_word)` pair is encrypted as a single
//! AES-128 block under a key derived from the configured secret, and the
//! ciphertext is hex-encoded behind a fixed tag string. Decoding inverts
//! every step; any token without the tag is rejected before the cipher
//! is consulted.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::error::{CoreError, Result};
use crate::types::{Location, LogOffset, ObjectId, PartitionId, OFFSET_BITS, OFFSET_MAX, PARTITION_MAX};

/// Reversible codec between `(id, partition, offset)` and opaque key text.
pub struct KeyCodec {
    cipher: Aes128,
    tag: String,
}

impl KeyCodec {
    /// Creates a codec for the given tag string and shared secret.
    ///
    /// The AES key is the first half of the BLAKE3 digest of the secret,
    /// so any two processes configured with the same secret produce
    /// interchangeable keys.
    pub fn new(tag: &str, secret: &str) -> Self {
        let derived = blake3::hash(secret.as_bytes());
        let cipher = Aes128::new(GenericArray::from_slice(&derived.as_bytes()[..16]));
        Self {
            cipher,
            tag: tag.to_string(),
        }
    }

    /// Encodes an id and log location into an opaque key.
    ///
    /// Fails with [`CoreError::OutOfRange`] if the partition exceeds 1023
    /// or the offset exceeds 2^54-1.
    pub fn encode(&self, id: ObjectId, partition: PartitionId, offset: LogOffset) -> Result<String> {
        if partition > PARTITION_MAX {
            return Err(CoreError::OutOfRange {
                field: "partition",
                value: partition as u64,
                max: PARTITION_MAX as u64,
            });
        }
        if offset > OFFSET_MAX {
            return Err(CoreError::OutOfRange {
                field: "offset",
                value: offset,
                max: OFFSET_MAX,
            });
        }

        let location_word = ((partition as u64) << OFFSET_BITS) | offset;

        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&id.to_be_bytes());
        block[8..].copy_from_slice(&location_word.to_be_bytes());

        let mut ga = GenericArray::clone_from_slice(&block);
        self.cipher.encrypt_block(&mut ga);

        Ok(format!("{}{}", self.tag, hex::encode(ga.as_slice())))
    }

    /// Decodes an opaque key back into its id and log location.
    ///
    /// Fails with [`CoreError::InvalidKey`] if the tag is missing or the
    /// encoded payload is not a valid ciphertext block.
    pub fn decode(&self, key: &str) -> Result<(ObjectId, Location)> {
        let body = key.strip_prefix(&self.tag).ok_or_else(|| CoreError::InvalidKey {
            reason: "key does not carry the configured tag".to_string(),
        })?;

        let raw = hex::decode(body).map_err(|e| CoreError::InvalidKey {
            reason: format!("payload is not hex: {e}"),
        })?;
        if raw.len() != 16 {
            return Err(CoreError::InvalidKey {
                reason: format!("payload is {} bytes, expected 16", raw.len()),
            });
        }

        let mut ga = GenericArray::clone_from_slice(&raw);
        self.cipher.decrypt_block(&mut ga);

        let mut id_bytes = [0u8; 8];
        let mut word_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&ga[..8]);
        word_bytes.copy_from_slice(&ga[8..]);

        let id = ObjectId::from_be_bytes(id_bytes);
        let location_word = u64::from_be_bytes(word_bytes);

        // The unpack shift must match the pack shift exactly.
        let offset = location_word & OFFSET_MAX;
        let partition = (location_word >> OFFSET_BITS) as PartitionId;
        if partition > PARTITION_MAX {
            return Err(CoreError::InvalidKey {
                reason: format!("decoded partition {partition} exceeds maximum"),
            });
        }

        Ok((id, Location::new(partition, offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> KeyCodec {
        KeyCodec::new("bv_", "unit-test-secret")
    }

    #[test]
    fn test_round_trip_basic() {
        let c = codec();
        let key = c.encode(42, 7, 1234).expect("encode failed");
        assert!(key.starts_with("bv_"));
        let (id, loc) = c.decode(&key).expect("decode failed");
        assert_eq!(id, 42);
        assert_eq!(loc.partition, 7);
        assert_eq!(loc.offset, 1234);
    }

    #[test]
    fn test_round_trip_extremes() {
        let c = codec();
        for (id, partition, offset) in [
            (0u64, 0u32, 0u64),
            (u64::MAX, PARTITION_MAX, OFFSET_MAX),
            (1, PARTITION_MAX, 0),
            (u64::MAX - 1, 0, OFFSET_MAX),
        ] {
            let key = c.encode(id, partition, offset).expect("encode failed");
            let (got_id, loc) = c.decode(&key).expect("decode failed");
            assert_eq!((got_id, loc.partition, loc.offset), (id, partition, offset));
        }
    }

    #[test]
    fn test_partition_out_of_range() {
        let c = codec();
        let err = c.encode(1, PARTITION_MAX + 1, 0).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { field: "partition", .. }));
    }

    #[test]
    fn test_offset_out_of_range() {
        let c = codec();
        let err = c.encode(1, 0, OFFSET_MAX + 1).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { field: "offset", .. }));
    }

    #[test]
    fn test_missing_tag_rejected() {
        let c = codec();
        let key = c.encode(9, 1, 2).expect("encode failed");
        let untagged = key.strip_prefix("bv_").expect("tag missing");
        let err = c.decode(untagged).unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }

    #[test]
    fn test_foreign_tag_rejected() {
        let c = codec();
        let err = c.decode("xx_00112233445566778899aabbccddeeff").unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }

    #[test]
    fn test_non_hex_payload_rejected() {
        let c = codec();
        let err = c.decode("bv_not-hex-at-all!").unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let c = codec();
        let err = c.decode("bv_00112233").unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }

    #[test]
    fn test_keys_are_opaque() {
        // Adjacent inputs must not produce visibly adjacent tokens.
        let c = codec();
        let k1 = c.encode(100, 0, 0).expect("encode failed");
        let k2 = c.encode(101, 0, 0).expect("encode failed");
        let differing = k1
            .bytes()
            .zip(k2.bytes())
            .filter(|(a, b)| a != b)
            .count();
        assert!(differing > 8);
    }

    #[test]
    fn test_different_secrets_reject_each_other() {
        let c1 = KeyCodec::new("bv_", "secret-one");
        let c2 = KeyCodec::new("bv_", "secret-two");
        let key = c1.encode(7, 3, 99).expect("encode failed");
        // Wrong secret either fails validation or decodes to a different tuple.
        match c2.decode(&key) {
            Ok((id, loc)) => assert_ne!((id, loc.partition, loc.offset), (7, 3, 99)),
            Err(e) => assert!(matches!(e, CoreError::InvalidKey { .. })),
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip(id in any::<u64>(), partition in 0u32..=PARTITION_MAX, offset in 0u64..=OFFSET_MAX) {
            let c = codec();
            let key = c.encode(id, partition, offset).expect("encode failed");
            let (got_id, loc) = c.decode(&key).expect("decode failed");
            prop_assert_eq!((got_id, loc.partition, loc.offset), (id, partition, offset));
        }

        #[test]
        fn prop_untagged_rejected(s in "[a-zA-Z0-9]{0,40}") {
            let c = codec();
            prop_assume!(!s.starts_with("bv_"));
            prop_assert!(c.decode(&s).is_err());
        }
    }
}
