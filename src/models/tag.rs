use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::TagId;

/// Normalizes a raw tag name: surrounding whitespace trimmed, lowercased.
///
/// Blank input normalizes to the empty string, which is still a valid name.
///
/// # Examples
///
/// ```
/// use notebook::normalize_tag_name;
///
/// assert_eq!(normalize_tag_name("  Finance "), "finance");
/// assert_eq!(normalize_tag_name("Machine Learning"), "machine learning");
/// assert_eq!(normalize_tag_name("   "), "");
/// ```
#[must_use]
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A normalized label attachable to notes.
///
/// Tags are created lazily on first reference and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl Tag {
    /// Creates a tag with a fresh id, normalizing `name`.
    pub fn create(name: &str, created_at: OffsetDateTime) -> Self {
        Self {
            id: TagId::generate(),
            name: normalize_tag_name(name),
            created_at,
        }
    }

    /// Rebuilds a tag from stored fields. `name` is taken as already normalized.
    pub fn from_parts(id: TagId, name: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
        }
    }

    /// Returns the tag's unique identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Returns the normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns when the tag was first referenced.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}
