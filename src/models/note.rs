use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{NoteId, Tag, TagId, UserId};

/// A user-owned note referencing zero or more tags.
///
/// Notes are immutable once stored. `tag_ids` keeps caller order and may hold
/// the same tag more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier assigned on creation.
    pub id: NoteId,
    /// Free-text title.
    pub title: String,
    /// Free-text body.
    pub content: String,
    /// Owner reference; the user itself lives outside this system.
    pub user_id: UserId,
    /// Referenced tags in assignment order.
    pub tag_ids: Vec<TagId>,
    /// When this note was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Note {
    /// Creates a note with a fresh id.
    pub fn create(
        title: impl Into<String>,
        content: impl Into<String>,
        user_id: UserId,
        tag_ids: Vec<TagId>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: NoteId::generate(),
            title: title.into(),
            content: content.into(),
            user_id,
            tag_ids,
            created_at,
        }
    }

    /// Returns true when `tag_id` appears at least once in this note.
    pub fn references(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }
}

/// A note joined with the names of the tags it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteWithLabels {
    pub note: Note,
    /// Tag names in tag-store order, each referenced tag once.
    pub labels: Vec<String>,
}

/// A tag paired with the number of distinct notes referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: Tag,
    pub note_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_keeps_duplicate_tag_ids_in_order() {
        let work = TagId::generate();
        let home = TagId::generate();
        let note = Note::create(
            "Plan",
            "body",
            UserId::generate(),
            vec![work, home, work],
            OffsetDateTime::now_utc(),
        );

        assert_eq!(note.tag_ids, vec![work, home, work]);
        assert!(note.references(home));
        assert!(!note.references(TagId::generate()));
    }

    #[test]
    fn serializes_created_at_as_rfc3339() {
        let created_at = time::macros::datetime!(2024-03-01 09:30:00 UTC);
        let note = Note::create("t", "c", UserId::generate(), Vec::new(), created_at);

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["created_at"], "2024-03-01T09:30:00Z");
    }
}
