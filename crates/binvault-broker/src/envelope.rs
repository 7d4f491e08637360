//! Record envelope written to the log.
//!
//! Every log record carries the allocated id, the raw payload bytes, and a
//! fixed method tag, serialized as a MessagePack map. Fetch unpacks the
//! same structure and rejects records produced by a different writer.

use serde::{Deserialize, Serialize};

use binvault_core::types::ObjectId;

use crate::error::{BrokerError, Result};

/// Method tag stamped into every record this writer produces.
pub const RECORD_METHOD: &str = "binvault";

/// Structured record stored in the log.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordEnvelope {
    /// Allocated object identifier.
    pub id: ObjectId,
    /// Raw payload bytes.
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// Writer method tag; must equal [`RECORD_METHOD`].
    pub method: String,
}

/// Serializes an envelope for the given id and payload.
pub fn pack(id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
    let envelope = RecordEnvelope {
        id,
        data: data.to_vec(),
        method: RECORD_METHOD.to_string(),
    };
    rmp_serde::to_vec_named(&envelope).map_err(|e| BrokerError::EncodeError {
        reason: e.to_string(),
    })
}

/// Parses a stored envelope and returns the raw payload bytes.
pub fn unpack(raw: &[u8]) -> Result<Vec<u8>> {
    let envelope: RecordEnvelope =
        rmp_serde::from_slice(raw).map_err(|e| BrokerError::DecodeError {
            reason: e.to_string(),
        })?;
    if envelope.method != RECORD_METHOD {
        return Err(BrokerError::DecodeError {
            reason: format!("unexpected method tag {:?}", envelope.method),
        });
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_round_trip() {
        let raw = pack(77, b"object bytes").expect("pack failed");
        let data = unpack(&raw).expect("unpack failed");
        assert_eq!(data, b"object bytes");
    }

    #[test]
    fn test_empty_payload() {
        let raw = pack(1, b"").expect("pack failed");
        assert_eq!(unpack(&raw).expect("unpack failed"), b"");
    }

    #[test]
    fn test_garbage_rejected() {
        let err = unpack(b"\xff\xff not msgpack").unwrap_err();
        assert!(matches!(err, BrokerError::DecodeError { .. }));
    }

    #[test]
    fn test_foreign_method_rejected() {
        let foreign = RecordEnvelope {
            id: 5,
            data: b"x".to_vec(),
            method: "someone-else".to_string(),
        };
        let raw = rmp_serde::to_vec_named(&foreign).expect("serialize failed");
        let err = unpack(&raw).unwrap_err();
        assert!(matches!(err, BrokerError::DecodeError { .. }));
    }

    #[test]
    fn test_id_survives_round_trip() {
        let raw = pack(u64::MAX, b"d").expect("pack failed");
        let envelope: RecordEnvelope = rmp_serde::from_slice(&raw).expect("parse failed");
        assert_eq!(envelope.id, u64::MAX);
        assert_eq!(envelope.method, RECORD_METHOD);
    }
}
