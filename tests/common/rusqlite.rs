use datarepo::{DataRepo, RusqliteConnector};
use tempfile::TempDir;

use super::schema::SCHEMA;

/// A repository over a fresh database file.
///
/// The repository opens a new connection per call, so the database lives in
/// a file that persists across calls; dropping the `TempDir` removes it.
pub fn setup_db() -> (TempDir, DataRepo<RusqliteConnector>) {
    super::init_tracing();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bookings.db");

    let conn = ::rusqlite::Connection::open(&path).expect("Failed to create database");
    conn.execute_batch(SCHEMA).expect("Failed to create tables");

    (dir, DataRepo::new(RusqliteConnector::new(path)))
}

/// Runs raw SQL against the repository's database.
pub fn exec(repo: &DataRepo<RusqliteConnector>, sql: &str) {
    let conn = ::rusqlite::Connection::open(repo.connector().path()).expect("Failed to open database");
    conn.execute_batch(sql).expect("Failed to run SQL");
}

/// Inserts two users and an event organized by the first.
/// Returns `(ana_id, bo_id, event_id)`.
pub fn seed(repo: &DataRepo<RusqliteConnector>) -> (i64, i64, i64) {
    use super::schema::{Event, User};

    let mut ana = User::new("dj_ana", "ana@example.com");
    let mut bo = User::new("bo", "bo@example.com");
    assert!(repo.insert(&mut ana));
    assert!(repo.insert(&mut bo));

    let mut event = Event::new("Warehouse Night", "Dock 4");
    event.organizer_id = ana.user_id;
    assert!(repo.insert(&mut event));

    (
        ana.user_id.expect("ana id"),
        bo.user_id.expect("bo id"),
        event.event_id.expect("event id"),
    )
}
