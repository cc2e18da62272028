//! SQLite store for entities, ratings, and persisted reputation scores.
//!
//! File-backed stores run in WAL mode with a 5s busy timeout so a reader
//! listing scores never blocks a rescoring writer. Every store enforces
//! foreign keys: a rating cannot name an unregistered entity.

pub mod migrations;
pub mod query;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};
use tracing::debug;

/// How long a connection waits on a locked store before failing.
pub const STORE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backing {
    File,
    Memory,
}

/// Open `path` as a rating store, creating the file and its directory as
/// needed, and migrate it to the latest schema.
///
/// # Errors
///
/// Returns an error if the file cannot be created or opened, or if the
/// schema cannot be brought up to date.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create store directory {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("open store {}", path.display()))?;
    prepare(conn, Backing::File)
}

/// A private in-memory store at the latest schema.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory store")?;
    prepare(conn, Backing::Memory)
}

fn prepare(mut conn: Connection, backing: Backing) -> Result<Connection> {
    conn.pragma_update(None, "foreign_keys", true)
        .context("enable foreign keys")?;

    if backing == Backing::File {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("switch to WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .context("set synchronous")?;
        conn.busy_timeout(STORE_BUSY_TIMEOUT)
            .context("set busy timeout")?;
        debug!(journal_mode = %mode, "store pragmas applied");
    }

    let version = migrations::migrate(&mut conn)?;
    debug!(version, ?backing, "store ready");
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pragma_i64(conn: &Connection, name: &str) -> i64 {
        conn.pragma_query_value(None, name, |row| row.get(0))
            .expect("pragma")
    }

    #[test]
    fn file_store_is_wal_with_timeout_and_foreign_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".rapport/rapport.db");
        let conn = open_store(&path).expect("open store");

        assert!(path.is_file());
        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("journal_mode");
        assert!(mode.eq_ignore_ascii_case("wal"));
        assert_eq!(
            u128::try_from(pragma_i64(&conn, "busy_timeout")).expect("non-negative"),
            STORE_BUSY_TIMEOUT.as_millis()
        );
        assert_eq!(pragma_i64(&conn, "foreign_keys"), 1);
        assert_eq!(
            migrations::current_schema_version(&conn).expect("version"),
            migrations::LATEST_SCHEMA_VERSION
        );
    }

    #[test]
    fn reopening_keeps_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rapport.db");
        {
            let conn = open_store(&path).expect("first open");
            conn.execute(
                "INSERT INTO entities (entity_id, name, created_at_us) VALUES (5, NULL, 0)",
                [],
            )
            .expect("insert");
        }
        let conn = open_store(&path).expect("second open");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn in_memory_store_enforces_foreign_keys() {
        let conn = open_in_memory().expect("open");
        let result = conn.execute(
            "INSERT INTO ratings (rater_id, target_id, score, updated_at_us) VALUES (1, 2, 5, 0)",
            [],
        );
        assert!(result.is_err(), "rating between unknown entities must fail");
    }
}
