use std::cmp::Reverse;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::models::{
    Note, NoteId, NoteView, ParseObjectIdError, Tag, TagId, TagView, UserId, normalize_tag_name,
};
use crate::store::{NoteFilter, NoteRepository, StoreError, TagRepository};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the note and tag use-cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller supplied a malformed identifier. Raised before any write.
    #[error("Invalid {field}: {source}")]
    InvalidArgument {
        field: &'static str,
        #[source]
        source: ParseObjectIdError,
    },

    /// A uniqueness conflict that refetching could not settle.
    #[error("write conflict: {0}")]
    Conflict(#[source] StoreError),

    /// Any other storage failure.
    #[error("storage failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        if value.is_conflict() {
            Self::Conflict(value)
        } else {
            Self::Store(value)
        }
    }
}

fn parse_user_id(value: &str) -> ServiceResult<UserId> {
    UserId::parse_str(value).map_err(|source| ServiceError::InvalidArgument {
        field: "userId",
        source,
    })
}

/// Turns raw tag names into tag ids, creating tags that do not exist yet.
#[derive(Clone)]
pub struct TagResolver {
    tags: Arc<dyn TagRepository>,
}

impl TagResolver {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    /// Resolves each name in order. Repeated names yield repeated ids.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> ServiceResult<Vec<TagId>> {
        names
            .iter()
            .map(|name| self.get_or_create_tag(name.as_ref()))
            .collect()
    }

    /// Gets or creates the tag for `name` after normalization.
    ///
    /// A blank name is not rejected; it maps to the tag named `""`. When a
    /// concurrent writer inserts the same name first, the store's uniqueness
    /// constraint rejects our insert and the winner is fetched instead.
    pub fn get_or_create_tag(&self, name: &str) -> ServiceResult<TagId> {
        let normalized = normalize_tag_name(name);

        if let Some(existing) = self.tags.find_by_name(&normalized)? {
            return Ok(existing.id());
        }

        let tag = Tag::create(&normalized, OffsetDateTime::now_utc());
        match self.tags.insert(&tag) {
            Ok(()) => {
                debug!(tag_id = %tag.id(), name = %normalized, "tag created");
                Ok(tag.id())
            }
            Err(err) if err.is_conflict() => {
                warn!(name = %normalized, "tag insert lost a race, refetching");
                match self.tags.find_by_name(&normalized)? {
                    Some(winner) => Ok(winner.id()),
                    None => Err(ServiceError::Conflict(err)),
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Input for [`NoteService::create_note`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    /// Unparsed owner id, validated before anything is written.
    pub user_id: String,
    /// Raw tag names.
    pub labels: Vec<String>,
}

/// Note creation and the filtered notes-with-tag-names query.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use notebook::{MemoryStore, NewNote, NoteService};
///
/// let store = Arc::new(MemoryStore::new());
/// let service = NoteService::new(store.clone(), store);
///
/// service.create_note(NewNote {
///     title: "Plan".to_string(),
///     content: "Long-term plan".to_string(),
///     user_id: "65a1b2c3d4e5f60718293a4b".to_string(),
///     labels: vec!["Finance".to_string()],
/// })?;
///
/// let notes = service.list_notes(None, Some("FINANCE"))?;
/// assert_eq!(notes[0].labels, vec!["finance"]);
/// # Ok::<(), notebook::ServiceError>(())
/// ```
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    tags: Arc<dyn TagRepository>,
    resolver: TagResolver,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteRepository>, tags: Arc<dyn TagRepository>) -> Self {
        let resolver = TagResolver::new(Arc::clone(&tags));
        Self {
            notes,
            tags,
            resolver,
        }
    }

    /// Creates a note, resolving its labels first.
    ///
    /// The owner id is validated before tag resolution, so a malformed id
    /// leaves both collections untouched. Tags created here are not rolled
    /// back if the note insert then fails.
    pub fn create_note(&self, input: NewNote) -> ServiceResult<NoteId> {
        let user_id = parse_user_id(&input.user_id)?;
        let tag_ids = self.resolver.resolve(&input.labels)?;

        let note = Note::create(
            input.title,
            input.content,
            user_id,
            tag_ids,
            OffsetDateTime::now_utc(),
        );
        self.notes.insert(&note)?;

        info!(
            note_id = %note.id,
            user_id = %note.user_id,
            labels = note.tag_ids.len(),
            "note created"
        );
        Ok(note.id)
    }

    /// Lists notes, optionally restricted to one user and/or one label.
    ///
    /// Empty strings count as absent filters. An unknown label yields an
    /// empty list rather than an error.
    pub fn list_notes(
        &self,
        user_id: Option<&str>,
        label: Option<&str>,
    ) -> ServiceResult<Vec<NoteView>> {
        let mut filter = NoteFilter::default();

        if let Some(user_id) = user_id.filter(|value| !value.is_empty()) {
            filter.user_id = Some(parse_user_id(user_id)?);
        }

        if let Some(label) = label.filter(|value| !value.is_empty()) {
            let normalized = normalize_tag_name(label);
            match self.tags.find_by_name(&normalized)? {
                Some(tag) => filter.tag_id = Some(tag.id()),
                None => {
                    debug!(label = %normalized, "label filter matches no tag");
                    return Ok(Vec::new());
                }
            }
        }

        let notes = self.notes.find_with_labels(&filter)?;
        debug!(count = notes.len(), "notes listed");
        Ok(notes.into_iter().map(NoteView::from).collect())
    }
}

/// Tag listing with per-tag note counts.
#[derive(Clone)]
pub struct TagService {
    notes: Arc<dyn NoteRepository>,
}

impl TagService {
    pub fn new(notes: Arc<dyn NoteRepository>) -> Self {
        Self { notes }
    }

    /// Lists every tag with the number of notes referencing it.
    ///
    /// Sorted by note count descending, then name ascending.
    pub fn list_tags(&self) -> ServiceResult<Vec<TagView>> {
        let mut counts = self.notes.count_by_tag()?;
        counts.sort_by(|a, b| {
            Reverse(a.note_count)
                .cmp(&Reverse(b.note_count))
                .then_with(|| a.tag.name().cmp(b.tag.name()))
        });
        Ok(counts.into_iter().map(TagView::from).collect())
    }
}
