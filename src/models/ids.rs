use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use time::OffsetDateTime;

const OBJECT_ID_LEN: usize = 12;
const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Error returned when a string is not a 24-character hex object id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid id: expected 24 hexadecimal characters")]
pub struct ParseObjectIdError {
    value: String,
}

impl ParseObjectIdError {
    /// Returns the rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Opaque 12-byte identifier used for every record and for user references.
///
/// Layout: 4-byte big-endian unix seconds, 5 bytes chosen once per process,
/// 3-byte big-endian counter. Rendered as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generates a new id for the current instant.
    pub fn new() -> Self {
        let seconds = OffsetDateTime::now_utc().unix_timestamp() as u32;
        let process = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Builds an id from its raw bytes.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub const fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Parses the 24-character hex form. Either letter case is accepted.
    pub fn parse_str(value: &str) -> Result<Self, ParseObjectIdError> {
        let invalid = || ParseObjectIdError {
            value: value.to_string(),
        };

        if value.len() != OBJECT_ID_LEN * 2 {
            return Err(invalid());
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    /// Returns the lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse_str(&value).map_err(serde::de::Error::custom)
    }
}

macro_rules! object_id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(ObjectId);

        impl $name {
            /// Generates a fresh identifier.
            pub fn generate() -> Self {
                Self(ObjectId::new())
            }

            /// Wraps an existing object id.
            pub const fn new(id: ObjectId) -> Self {
                Self(id)
            }

            /// Returns the underlying object id.
            pub const fn get(self) -> ObjectId {
                self.0
            }

            /// Parses the 24-character hex form.
            pub fn parse_str(value: &str) -> Result<Self, ParseObjectIdError> {
                ObjectId::parse_str(value).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseObjectIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_str(s)
            }
        }
    };
}

object_id_newtype!(
    /// Unique identifier for a note.
    NoteId
);

object_id_newtype!(
    /// Unique identifier for a tag.
    TagId
);

object_id_newtype!(
    /// Reference to an externally owned user. Existence is never checked.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_accepts_24_hex_characters_in_either_case() {
        let lower = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let upper = ObjectId::parse_str("65A1B2C3D4E5F60718293A4B").unwrap();

        assert_eq!(lower, upper);
        assert_eq!(upper.to_string(), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex_input() {
        for input in [
            "",
            "not-a-valid-id",
            "65a1b2c3d4e5f60718293a4",
            "65a1b2c3d4e5f60718293a4b0",
            "zza1b2c3d4e5f60718293a4b",
            " 65a1b2c3d4e5f60718293a4b",
        ] {
            let err = ObjectId::parse_str(input).unwrap_err();
            assert_eq!(err.value(), input);
        }
    }

    #[test]
    fn generated_ids_are_unique_and_share_process_bytes() {
        let ids: Vec<ObjectId> = (0..1000).map(|_| ObjectId::new()).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        let process = &ids[0].bytes()[4..9];
        assert!(ids.iter().all(|id| &id.bytes()[4..9] == process));
    }

    #[test]
    fn generated_id_leads_with_current_unix_seconds() {
        let before = OffsetDateTime::now_utc().unix_timestamp() as u32;
        let id = ObjectId::new();
        let after = OffsetDateTime::now_utc().unix_timestamp() as u32;

        let bytes = id.bytes();
        let seconds = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert!(seconds >= before && seconds <= after);
    }

    #[test]
    fn newtypes_serialize_as_hex_strings() {
        let id = NoteId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65a1b2c3d4e5f60718293a4b\"");

        let back: NoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn newtype_deserialization_rejects_malformed_ids() {
        let result = serde_json::from_str::<UserId>("\"nope\"");
        assert!(result.is_err());
    }

    #[test]
    fn ids_are_not_interchangeable() {
        // `let tag_id: TagId = NoteId::generate();` does not compile.
        let raw = ObjectId::new();
        let note_id = NoteId::new(raw);
        let tag_id = TagId::new(raw);

        assert_eq!(note_id.get(), tag_id.get());
    }
}
