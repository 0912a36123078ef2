//! Storage capabilities the services depend on.
//!
//! Each trait is the narrow set of operations one collection has to offer.
//! `Database` implements them on SQLite; `MemoryStore` implements them on
//! plain vectors for tests.

mod memory;

use thiserror::Error;

use crate::models::{Note, NoteWithLabels, Tag, TagCount, TagId, UserId};

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("{collection} already contains a record with {key}")]
    Conflict {
        collection: &'static str,
        key: String,
    },

    /// SQLite reported an error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored row could not be decoded into a domain value.
    #[error("invalid stored data: {0}")]
    InvalidData(String),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Returns true when the error is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Filter applied by [`NoteRepository::find_with_labels`]. Fields combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Only notes owned by this user.
    pub user_id: Option<UserId>,
    /// Only notes referencing this tag.
    pub tag_id: Option<TagId>,
}

/// Tag collection, unique on normalized name.
pub trait TagRepository: Send + Sync {
    /// Finds the tag with exactly this (already normalized) name.
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Tag>>;

    /// Inserts a tag. Fails with [`StoreError::Conflict`] when the name is taken.
    fn insert(&self, tag: &Tag) -> StoreResult<()>;
}

/// Note collection plus the two joins against the tag collection.
pub trait NoteRepository: Send + Sync {
    /// Inserts a note.
    fn insert(&self, note: &Note) -> StoreResult<()>;

    /// Returns matching notes in insertion order, each joined with the names
    /// of the tags it references (tag insertion order, each tag once).
    fn find_with_labels(&self, filter: &NoteFilter) -> StoreResult<Vec<NoteWithLabels>>;

    /// Returns every tag in insertion order with the number of distinct notes
    /// referencing it.
    fn count_by_tag(&self) -> StoreResult<Vec<TagCount>>;
}
