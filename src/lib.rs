//! Tagged note-taking backend: notes with normalized, lazily created tags,
//! served over a small JSON HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;

pub use api::{AppState, router};
pub use config::{Config, ConfigError};
pub use db::{Database, StoreLocation};
pub use models::{
    Note, NoteId, NoteView, ObjectId, ParseObjectIdError, Tag, TagId, TagView, UserId,
    normalize_tag_name,
};
pub use service::{NewNote, NoteService, ServiceError, TagResolver, TagService};
pub use store::{MemoryStore, NoteFilter, NoteRepository, StoreError, TagRepository};
