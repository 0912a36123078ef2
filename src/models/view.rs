use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{NoteWithLabels, TagCount};

/// Wire representation of a note with joined tag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_id: String,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
    pub labels: Vec<String>,
}

impl From<NoteWithLabels> for NoteView {
    fn from(value: NoteWithLabels) -> Self {
        let NoteWithLabels { note, labels } = value;
        Self {
            id: note.id.to_string(),
            title: note.title,
            content: note.content,
            user_id: note.user_id.to_string(),
            created_at: format_timestamp(note.created_at),
            labels,
        }
    }
}

/// Wire representation of a tag with its computed note count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    pub id: String,
    pub name: String,
    pub note_count: u64,
}

impl From<TagCount> for TagView {
    fn from(value: TagCount) -> Self {
        Self {
            id: value.tag.id().to_string(),
            name: value.tag.name().to_string(),
            note_count: value.note_count,
        }
    }
}

fn format_timestamp(value: OffsetDateTime) -> String {
    // Rfc3339 only fails for offsets with seconds or years outside 0..=9999,
    // neither of which the stores produce.
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Note, Tag, UserId};
    use time::macros::datetime;

    #[test]
    fn note_view_uses_camel_case_keys_and_string_ids() {
        let user_id = UserId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let note = Note::create(
            "Plan",
            "Long-term plan",
            user_id,
            Vec::new(),
            datetime!(2024-05-06 07:08:09.5 UTC),
        );
        let note_id = note.id.to_string();
        let view = NoteView::from(NoteWithLabels {
            note,
            labels: vec!["finance".to_string()],
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], note_id);
        assert_eq!(json["userId"], "65a1b2c3d4e5f60718293a4b");
        assert_eq!(json["createdAt"], "2024-05-06T07:08:09.5Z");
        assert_eq!(json["labels"], serde_json::json!(["finance"]));
    }

    #[test]
    fn tag_view_exposes_note_count() {
        let tag = Tag::create("Finance", datetime!(2024-01-01 00:00 UTC));
        let tag_id = tag.id().to_string();
        let view = TagView::from(TagCount { tag, note_count: 3 });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], tag_id);
        assert_eq!(json["name"], "finance");
        assert_eq!(json["noteCount"], 3);
    }
}
