mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::models::{Note, NoteId, NoteWithLabels, Tag, TagCount, TagId, UserId};
use crate::store::{NoteFilter, NoteRepository, StoreError, StoreResult, TagRepository};

pub use schema::INITIAL_SCHEMA;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, discarded on exit.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

/// SQLite-backed store implementing both repositories.
///
/// One connection is shared behind a mutex; the busy timeout covers other
/// processes writing the same file.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self::bootstrap(conn)?;
        info!(mode = "memory", "database opened");
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist, then creates any
    /// missing tables and indexes.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let db = Self::bootstrap(conn)?;
        info!(mode = "file", path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens the store described by `location`.
    pub fn connect(location: &StoreLocation) -> StoreResult<Self> {
        match location {
            StoreLocation::Memory => Self::in_memory(),
            StoreLocation::File(path) => Self::open(path),
        }
    }

    fn bootstrap(mut conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Locks and returns the underlying connection.
    ///
    /// Useful for inspecting the schema in tests.
    pub fn connection(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TagRepository for Database {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Tag>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                "SELECT id, name, created_at FROM labels WHERE name = ?1",
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, created_at)| -> StoreResult<Tag> {
            Ok(Tag::from_parts(
                parse_id(&id, "labels.id")?,
                name,
                timestamp_from_micros(created_at)?,
            ))
        })
        .transpose()
    }

    fn insert(&self, tag: &Tag) -> StoreResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO labels (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                tag.id().to_string(),
                tag.name(),
                timestamp_to_micros(tag.created_at())
            ],
        )
        .map_err(|err| conflict_or(err, "labels", || format!("name '{}'", tag.name())))?;
        debug!(tag_id = %tag.id(), name = tag.name(), "tag inserted");
        Ok(())
    }
}

impl NoteRepository for Database {
    fn insert(&self, note: &Note) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let note_id = note.id.to_string();

        tx.execute(
            "INSERT INTO notes (id, title, content, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                note_id,
                note.title,
                note.content,
                note.user_id.to_string(),
                timestamp_to_micros(note.created_at),
            ],
        )
        .map_err(|err| conflict_or(err, "notes", || format!("id {note_id}")))?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO note_labels (note_id, position, label_id) VALUES (?1, ?2, ?3)",
            )?;
            for (position, tag_id) in note.tag_ids.iter().enumerate() {
                stmt.execute(params![note_id, position as i64, tag_id.to_string()])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn find_with_labels(&self, filter: &NoteFilter) -> StoreResult<Vec<NoteWithLabels>> {
        let conn = self.connection()?;
        let user_id = filter.user_id.map(|id| id.to_string());
        let tag_id = filter.tag_id.map(|id| id.to_string());

        let mut stmt = conn.prepare(
            "SELECT id, title, content, user_id, created_at
             FROM notes
             WHERE (?1 IS NULL OR user_id = ?1)
               AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM note_labels nl
                    WHERE nl.note_id = notes.id AND nl.label_id = ?2
               ))
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![user_id, tag_id], NoteRow::from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            let row = row?;
            let tag_ids = load_tag_ids(&conn, &row.id)?;
            let labels = load_label_names(&conn, &row.id)?;
            notes.push(NoteWithLabels {
                note: row.into_note(tag_ids)?,
                labels,
            });
        }

        Ok(notes)
    }

    fn count_by_tag(&self) -> StoreResult<Vec<TagCount>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT l.id, l.name, l.created_at, COUNT(DISTINCT nl.note_id)
             FROM labels l
             LEFT JOIN note_labels nl ON nl.label_id = l.id
             GROUP BY l.id
             ORDER BY l.rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (id, name, created_at, note_count) = row?;
            counts.push(TagCount {
                tag: Tag::from_parts(
                    parse_id(&id, "labels.id")?,
                    name,
                    timestamp_from_micros(created_at)?,
                ),
                note_count: u64::try_from(note_count).map_err(|_| {
                    StoreError::InvalidData(format!("negative note count {note_count}"))
                })?,
            });
        }

        Ok(counts)
    }
}

/// Creates the schema if missing.
///
/// Runs under an immediate transaction so processes opening the same new
/// file take turns on the busy timeout instead of racing the DDL.
fn initialize_schema(conn: &mut Connection) -> StoreResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(INITIAL_SCHEMA)?;
    tx.commit()?;
    debug!("schema initialized");
    Ok(())
}

struct NoteRow {
    id: String,
    title: String,
    content: String,
    user_id: String,
    created_at: i64,
}

impl NoteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            user_id: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_note(self, tag_ids: Vec<TagId>) -> StoreResult<Note> {
        Ok(Note {
            id: parse_id::<NoteId>(&self.id, "notes.id")?,
            title: self.title,
            content: self.content,
            user_id: parse_id::<UserId>(&self.user_id, "notes.user_id")?,
            tag_ids,
            created_at: timestamp_from_micros(self.created_at)?,
        })
    }
}

fn load_tag_ids(conn: &Connection, note_id: &str) -> StoreResult<Vec<TagId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT label_id FROM note_labels WHERE note_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([note_id], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_id(&row?, "note_labels.label_id")?);
    }
    Ok(ids)
}

fn load_label_names(conn: &Connection, note_id: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name FROM labels
         WHERE id IN (SELECT label_id FROM note_labels WHERE note_id = ?1)
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map([note_id], |row| row.get::<_, String>(0))?;

    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

/// Maps unique/primary-key violations to [`StoreError::Conflict`].
fn conflict_or(
    err: rusqlite::Error,
    collection: &'static str,
    key: impl FnOnce() -> String,
) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::Conflict {
                collection,
                key: key(),
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

fn parse_id<T: std::str::FromStr>(value: &str, column: &str) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::InvalidData(format!("invalid id `{value}` in {column}")))
}

fn timestamp_to_micros(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000) as i64
}

fn timestamp_from_micros(micros: i64) -> StoreResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .map_err(|err| StoreError::InvalidData(format!("invalid timestamp {micros}: {err}")))
}

#[cfg(test)]
#[path = "db/tests.rs"]
mod tests;
