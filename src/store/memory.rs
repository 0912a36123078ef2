use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{NoteFilter, NoteRepository, StoreError, StoreResult, TagRepository};
use crate::models::{Note, NoteId, NoteWithLabels, Tag, TagCount};

#[derive(Debug, Default)]
struct Collections {
    tags: Vec<Tag>,
    notes: Vec<Note>,
}

/// Vector-backed store holding both collections behind one lock.
///
/// Natural order is insertion order, matching what `Database` returns.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tags.
    pub fn tag_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.tags.len())
    }

    /// Number of stored notes.
    pub fn note_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.notes.len())
    }

    /// Returns a stored note by id.
    pub fn note(&self, id: NoteId) -> StoreResult<Option<Note>> {
        Ok(self.read()?.notes.iter().find(|note| note.id == id).cloned())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl TagRepository for MemoryStore {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Tag>> {
        Ok(self
            .read()?
            .tags
            .iter()
            .find(|tag| tag.name() == name)
            .cloned())
    }

    fn insert(&self, tag: &Tag) -> StoreResult<()> {
        let mut collections = self.write()?;
        if collections
            .tags
            .iter()
            .any(|existing| existing.name() == tag.name() || existing.id() == tag.id())
        {
            return Err(StoreError::Conflict {
                collection: "labels",
                key: format!("name '{}'", tag.name()),
            });
        }
        collections.tags.push(tag.clone());
        Ok(())
    }
}

impl NoteRepository for MemoryStore {
    fn insert(&self, note: &Note) -> StoreResult<()> {
        let mut collections = self.write()?;
        if collections.notes.iter().any(|existing| existing.id == note.id) {
            return Err(StoreError::Conflict {
                collection: "notes",
                key: format!("id {}", note.id),
            });
        }
        collections.notes.push(note.clone());
        Ok(())
    }

    fn find_with_labels(&self, filter: &NoteFilter) -> StoreResult<Vec<NoteWithLabels>> {
        let collections = self.read()?;
        let matches = collections
            .notes
            .iter()
            .filter(|note| filter.user_id.is_none_or(|user_id| note.user_id == user_id))
            .filter(|note| filter.tag_id.is_none_or(|tag_id| note.references(tag_id)));

        Ok(matches
            .map(|note| NoteWithLabels {
                note: note.clone(),
                labels: collections
                    .tags
                    .iter()
                    .filter(|tag| note.references(tag.id()))
                    .map(|tag| tag.name().to_string())
                    .collect(),
            })
            .collect())
    }

    fn count_by_tag(&self) -> StoreResult<Vec<TagCount>> {
        let collections = self.read()?;
        Ok(collections
            .tags
            .iter()
            .map(|tag| TagCount {
                tag: tag.clone(),
                note_count: collections
                    .notes
                    .iter()
                    .filter(|note| note.references(tag.id()))
                    .count() as u64,
            })
            .collect())
    }
}
