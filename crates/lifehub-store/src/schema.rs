//! # Versioned Storage Schema
//!
//! Every value the store persists is wrapped in a versioned envelope.
//!
//! ## Why an Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stored Value Layout                                │
//! │                                                                         │
//! │   { "version": 1,                                                      │
//! │     "written_at": "2026-08-06T12:00:00Z",                              │
//! │     "payload": { ... caller value ... } }                              │
//! │                                                                         │
//! │  READ PATH:                                                            │
//! │  1. Parse envelope. A blob with no envelope is treated as a legacy     │
//! │     version-0 value (bare payload) and migrated forward.               │
//! │  2. version > SCHEMA_VERSION → refuse (written by a newer build)       │
//! │  3. version < SCHEMA_VERSION → run migrations, then decode payload     │
//! │                                                                         │
//! │  The version tag is the single source of truth for the stored shape;   │
//! │  readers never probe candidate shapes.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// The versioned wrapper around every stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Schema version the payload was written under.
    pub version: u32,

    /// When the value was written.
    pub written_at: DateTime<Utc>,

    /// The caller's value.
    pub payload: serde_json::Value,
}

/// Encodes a value into the current envelope format.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<String> {
    let envelope = Envelope {
        version: SCHEMA_VERSION,
        written_at: Utc::now(),
        payload: serde_json::to_value(value)?,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a stored blob, migrating older schema versions forward.
pub fn decode<T: DeserializeOwned>(raw: &str) -> StoreResult<T> {
    let envelope = parse_envelope(raw)?;

    if envelope.version > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found: envelope.version,
            supported: SCHEMA_VERSION,
        });
    }

    let envelope = migrate(envelope);
    Ok(serde_json::from_value(envelope.payload)?)
}

/// Parses a raw blob into an envelope.
///
/// Blobs written before the envelope existed are bare payloads; they parse
/// as version 0 so the migration path owns them too.
fn parse_envelope(raw: &str) -> StoreResult<Envelope> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let looks_versioned = value
        .as_object()
        .map(|obj| obj.contains_key("version") && obj.contains_key("payload"))
        .unwrap_or(false);

    if looks_versioned {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(Envelope {
            version: 0,
            written_at: Utc::now(),
            payload: value,
        })
    }
}

/// Walks an envelope forward to [`SCHEMA_VERSION`].
fn migrate(mut envelope: Envelope) -> Envelope {
    // v0 → v1: bare payload gains the envelope. The payload shape itself
    // is unchanged, so this is a pure re-tag.
    if envelope.version == 0 {
        envelope.version = 1;
    }

    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_decode_round_trip() {
        let value = json!({"name": "lifehub", "count": 3});
        let raw = encode(&value).unwrap();
        let decoded: serde_json::Value = decode(&raw).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_envelope_carries_current_version() {
        let raw = encode(&json!({"a": 1})).unwrap();
        let envelope: Envelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_legacy_bare_payload_migrates() {
        // A value written before the envelope existed
        let raw = r#"{"user_id":"u1","access_token":"tok"}"#;
        let decoded: serde_json::Value = decode(raw).unwrap();
        assert_eq!(decoded["user_id"], "u1");
    }

    #[test]
    fn test_future_schema_is_refused() {
        let raw = serde_json::to_string(&Envelope {
            version: SCHEMA_VERSION + 1,
            written_at: Utc::now(),
            payload: json!({}),
        })
        .unwrap();

        match decode::<serde_json::Value>(&raw) {
            Err(StoreError::SchemaTooNew { found, supported }) => {
                assert_eq!(found, SCHEMA_VERSION + 1);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected SchemaTooNew, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_an_encode_error() {
        assert!(matches!(
            decode::<serde_json::Value>("not json at all"),
            Err(StoreError::Encode(_))
        ));
    }
}
