use super::*;
use tempfile::tempdir;

fn tag(db: &Database, name: &str) -> Tag {
    let tag = Tag::create(name, OffsetDateTime::now_utc());
    TagRepository::insert(db, &tag).unwrap();
    tag
}

fn note(db: &Database, user_id: UserId, tag_ids: Vec<TagId>) -> Note {
    let note = Note::create("title", "content", user_id, tag_ids, OffsetDateTime::now_utc());
    NoteRepository::insert(db, &note).unwrap();
    note
}

fn names(conn: &Connection, kind: &str, pattern: &str) -> Vec<String> {
    conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 AND name LIKE ?2 ORDER BY name")
        .unwrap()
        .query_map([kind, pattern], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect()
}

#[test]
fn in_memory_opens_successfully() {
    let result = Database::in_memory();
    assert!(result.is_ok());
}

#[test]
fn schema_tables_exist() {
    let db = Database::in_memory().unwrap();
    let conn = db.connection().unwrap();

    let tables = names(&conn, "table", "%");
    assert!(tables.contains(&"labels".to_string()));
    assert!(tables.contains(&"notes".to_string()));
    assert!(tables.contains(&"note_labels".to_string()));
}

#[test]
fn schema_indexes_exist() {
    let db = Database::in_memory().unwrap();
    let conn = db.connection().unwrap();

    let indexes = names(&conn, "index", "idx_%");
    assert_eq!(
        indexes,
        vec![
            "idx_labels_name",
            "idx_note_labels_label",
            "idx_notes_created",
            "idx_notes_user",
        ]
    );
}

#[test]
fn foreign_keys_enabled() {
    let db = Database::in_memory().unwrap();
    let fk_enabled: i32 = db
        .connection()
        .unwrap()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();

    assert_eq!(fk_enabled, 1);
}

#[test]
fn reopening_file_database_keeps_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let stored = {
        let db = Database::open(&path).unwrap();
        tag(&db, "finance")
    };

    let db = Database::open(&path).unwrap();
    let found = db.find_by_name("finance").unwrap().expect("tag should persist");
    assert_eq!(found.id(), stored.id());
    assert_eq!(names(&db.connection().unwrap(), "index", "idx_%").len(), 4);
}

#[test]
fn concurrent_open_of_a_new_file_succeeds_everywhere() {
    const OPENERS: usize = 4;

    for round in 0..10 {
        let dir = tempdir().unwrap();
        let path = dir.path().join(format!("round-{round}.sqlite3"));
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(OPENERS));

        let handles: Vec<_> = (0..OPENERS)
            .map(|_| {
                let path = path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    Database::open(&path).map(|_| ())
                })
            })
            .collect();

        let failures: Vec<String> = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap().err())
            .map(|err| err.to_string())
            .collect();
        assert!(failures.is_empty(), "round {round} failures: {failures:?}");

        let db = Database::open(&path).unwrap();
        let tables = names(&db.connection().unwrap(), "table", "%");
        assert_eq!(tables, vec!["labels", "note_labels", "notes"]);
    }
}

#[test]
fn connect_dispatches_on_location() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("connect.sqlite3");

    Database::connect(&StoreLocation::Memory).unwrap();
    Database::connect(&StoreLocation::File(path.clone())).unwrap();
    assert!(path.exists());
}

#[test]
fn duplicate_tag_name_maps_to_conflict() {
    let db = Database::in_memory().unwrap();
    tag(&db, "work");

    let err = TagRepository::insert(&db, &Tag::create("work", OffsetDateTime::now_utc()))
        .unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err}");
}

#[test]
fn find_by_name_is_exact_match_on_normalized_name() {
    let db = Database::in_memory().unwrap();
    let work = tag(&db, "Work");

    assert_eq!(db.find_by_name("work").unwrap().map(|t| t.id()), Some(work.id()));
    assert_eq!(db.find_by_name("Work").unwrap(), None);
}

#[test]
fn tag_round_trips_created_at_at_microsecond_precision() {
    let db = Database::in_memory().unwrap();
    let created_at = time::macros::datetime!(2024-02-03 04:05:06.123456 UTC);
    TagRepository::insert(&db, &Tag::create("dated", created_at)).unwrap();

    let found = db.find_by_name("dated").unwrap().unwrap();
    assert_eq!(found.created_at(), created_at);
}

#[test]
fn note_insert_preserves_tag_order_and_duplicates() {
    let db = Database::in_memory().unwrap();
    let work = tag(&db, "work");
    let home = tag(&db, "home");
    let stored = note(&db, UserId::generate(), vec![home.id(), work.id(), home.id()]);

    let found = db.find_with_labels(&NoteFilter::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].note.id, stored.id);
    assert_eq!(found[0].note.tag_ids, vec![home.id(), work.id(), home.id()]);
    assert_eq!(found[0].labels, vec!["work", "home"]);
}

#[test]
fn note_referencing_unknown_tag_is_rejected() {
    let db = Database::in_memory().unwrap();
    let orphan = Note::create(
        "t",
        "c",
        UserId::generate(),
        vec![TagId::generate()],
        OffsetDateTime::now_utc(),
    );

    assert!(NoteRepository::insert(&db, &orphan).is_err());
    assert!(db.find_with_labels(&NoteFilter::default()).unwrap().is_empty());
}

#[test]
fn find_with_labels_filters_by_user_and_tag() {
    let db = Database::in_memory().unwrap();
    let work = tag(&db, "work");
    let alice = UserId::generate();
    let bob = UserId::generate();
    let alice_work = note(&db, alice, vec![work.id()]);
    let alice_plain = note(&db, alice, Vec::new());
    let bob_work = note(&db, bob, vec![work.id()]);

    let by_user: Vec<NoteId> = db
        .find_with_labels(&NoteFilter {
            user_id: Some(alice),
            tag_id: None,
        })
        .unwrap()
        .into_iter()
        .map(|found| found.note.id)
        .collect();
    assert_eq!(by_user, vec![alice_work.id, alice_plain.id]);

    let by_tag: Vec<NoteId> = db
        .find_with_labels(&NoteFilter {
            user_id: None,
            tag_id: Some(work.id()),
        })
        .unwrap()
        .into_iter()
        .map(|found| found.note.id)
        .collect();
    assert_eq!(by_tag, vec![alice_work.id, bob_work.id]);

    let both = db
        .find_with_labels(&NoteFilter {
            user_id: Some(bob),
            tag_id: Some(work.id()),
        })
        .unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].note.id, bob_work.id);
}

#[test]
fn count_by_tag_counts_each_note_once_and_includes_unused_tags() {
    let db = Database::in_memory().unwrap();
    let work = tag(&db, "work");
    let unused = tag(&db, "unused");
    let user = UserId::generate();
    note(&db, user, vec![work.id(), work.id(), work.id()]);
    note(&db, user, vec![work.id()]);

    let counts = db.count_by_tag().unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].tag.id(), work.id());
    assert_eq!(counts[0].note_count, 2);
    assert_eq!(counts[1].tag.id(), unused.id());
    assert_eq!(counts[1].note_count, 0);
}
