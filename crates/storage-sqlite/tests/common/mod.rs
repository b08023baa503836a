//! Shared test harness: a migrated SQLite database in a temp directory.

use gestima_storage_sqlite::{init, DbPool, WriteHandle};
use tempfile::TempDir;

pub fn test_db() -> (DbPool, WriteHandle, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let (pool, writer) = init(&dir.path().join("gestima-test.db")).expect("init db");
    (pool, writer, dir)
}
