/// Initial schema: the tag and note collections plus the ordered tag list.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS so a half-applied run can be retried.
/// Each table keeps its implicit rowid, which is the natural (insertion) order.
pub const INITIAL_SCHEMA: &str = r#"
-- Tags: one row per normalized name
CREATE TABLE IF NOT EXISTS labels (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_labels_name ON labels(name);

-- Notes: immutable after insert
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
CREATE INDEX IF NOT EXISTS idx_notes_created ON notes(created_at);

-- A note's tag id list; position keeps caller order and allows repeats
CREATE TABLE IF NOT EXISTS note_labels (
    note_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    label_id TEXT NOT NULL,
    PRIMARY KEY (note_id, position),
    FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE,
    FOREIGN KEY (label_id) REFERENCES labels(id)
);

CREATE INDEX IF NOT EXISTS idx_note_labels_label ON note_labels(label_id);
"#;
