//! Comment records and their document identifiers.
//!
//! A comment is opaque to everything above the store: it carries an `id`
//! plus whatever other fields the producer stored, kept verbatim as a JSON
//! object and serialized flat next to the id.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::DataAccessError;

/// Length of an identifier in bytes
pub const ID_LEN: usize = 12;

const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// 12-byte document identifier, rendered as 24 lowercase hex characters.
///
/// Layout: 4-byte big-endian Unix seconds, 5 process-unique random bytes,
/// 3-byte big-endian counter. Ids minted by one process sort in creation
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommentId([u8; ID_LEN]);

impl CommentId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        let timestamp = Utc::now().timestamp() as u32;
        let process = *PROCESS_UNIQUE.get_or_init(rand::random);
        Self::from_parts(timestamp, process, next_counter())
    }

    /// Assemble an identifier from its components. Only the low 24 bits of
    /// `counter` are kept.
    pub fn from_parts(timestamp: u32, process: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&process);
        bytes[9..].copy_from_slice(&(counter & COUNTER_MASK).to_be_bytes()[1..]);
        CommentId(bytes)
    }

    /// Decode a raw store key. Fails unless `bytes` is exactly 12 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DataAccessError> {
        let bytes: [u8; ID_LEN] = bytes.try_into().map_err(|_| DataAccessError::Corrupt {
            reason: format!("Invalid key length {}", bytes.len()),
        })?;
        Ok(CommentId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Seconds since the Unix epoch at which this id was minted.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Parse the 24-character hex form.
    pub fn parse(value: &str) -> Result<Self, DataAccessError> {
        if value.len() != ID_LEN * 2 {
            return Err(DataAccessError::malformed_id(value));
        }

        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(value, &mut bytes)
            .map_err(|_| DataAccessError::malformed_id(value))?;

        Ok(CommentId(bytes))
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

fn next_counter() -> u32 {
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
        .fetch_add(1, Ordering::Relaxed)
        & COUNTER_MASK
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for CommentId {
    type Err = DataAccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommentId::parse(s)
    }
}

impl Serialize for CommentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CommentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        CommentId::parse(&value).map_err(de::Error::custom)
    }
}

/// A stored comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique document identifier
    pub id: CommentId,
    /// Every other field, untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Comment {
    /// Create a comment with a freshly minted id.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self::with_id(CommentId::new(), fields)
    }

    /// Create a comment with a caller-chosen id. Any `id`/`_id` keys in
    /// `fields` are dropped so the record serializes with a single id.
    pub fn with_id(id: CommentId, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        fields.remove("_id");
        Comment { id, fields }
    }

    /// Build a comment from an arbitrary JSON object.
    ///
    /// An `id` (or `_id`) holding a valid identifier is kept; otherwise a new
    /// id is minted. Non-object values are rejected.
    pub fn from_value(value: Value) -> Result<Self, DataAccessError> {
        let Value::Object(fields) = value else {
            return Err(DataAccessError::Corrupt {
                reason: "Comment must be a JSON object".to_string(),
            });
        };

        let id = ["id", "_id"]
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .find_map(|raw| CommentId::parse(raw).ok())
            .unwrap_or_default();

        Ok(Self::with_id(id, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_round_trips_display() {
        let raw = "65a1f0c2e4b0a1b2c3d4e5f6";
        let id = CommentId::parse(raw).unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(id.timestamp(), 0x65a1f0c2);
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let id = CommentId::parse("65A1F0C2E4B0A1B2C3D4E5F6").unwrap();
        assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "1", "not-an-id", "65a1f0c2e4b0a1b2c3d4e5f", "65a1f0c2e4b0a1b2c3d4e5fz"] {
            let err = CommentId::parse(raw).unwrap_err();
            assert!(matches!(err, DataAccessError::MalformedId { .. }), "{raw}");
        }
    }

    #[test]
    fn test_new_ids_are_unique_and_ordered() {
        let first = CommentId::new();
        let second = CommentId::new();
        assert_ne!(first, second);
        assert_eq!(first.as_bytes()[4..9], second.as_bytes()[4..9]);
        assert!(second.timestamp() >= first.timestamp());
    }

    #[test]
    fn test_from_parts_layout() {
        let id = CommentId::from_parts(1, [2, 3, 4, 5, 6], 0x0107_0809);
        assert_eq!(id.as_bytes(), &[0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert!(CommentId::from_parts(1, [0; 5], 2) < CommentId::from_parts(2, [0; 5], 1));
    }

    #[test]
    fn test_from_slice_checks_length() {
        assert!(CommentId::from_slice(&[0u8; 12]).is_ok());
        assert!(CommentId::from_slice(&[0u8; 11]).is_err());
    }

    #[test]
    fn test_comment_serializes_flat() {
        let id = CommentId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let fields = json!({ "text": "a", "id": "ignored" });
        let comment = Comment::with_id(id, fields.as_object().cloned().unwrap());

        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(value, json!({ "id": "65a1f0c2e4b0a1b2c3d4e5f6", "text": "a" }));

        let back: Comment = serde_json::from_value(value).unwrap();
        assert_eq!(back, comment);
    }

    #[test]
    fn test_from_value_keeps_valid_id() {
        let comment =
            Comment::from_value(json!({ "_id": "65a1f0c2e4b0a1b2c3d4e5f6", "body": "hi" })).unwrap();
        assert_eq!(comment.id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(comment.fields.get("body"), Some(&json!("hi")));
        assert!(!comment.fields.contains_key("_id"));
    }

    #[test]
    fn test_from_value_mints_id_for_invalid() {
        let comment = Comment::from_value(json!({ "id": "1", "text": "a" })).unwrap();
        assert_ne!(comment.id.to_string(), "1");
        assert_eq!(comment.fields.len(), 1);

        assert!(Comment::from_value(json!(["not", "an", "object"])).is_err());
    }
}
