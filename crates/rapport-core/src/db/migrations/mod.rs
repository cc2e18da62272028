//! Versioned schema upgrades for the rating store.
//!
//! The applied version lives in `PRAGMA user_version` and is mirrored into
//! `store_meta.schema_version` for anyone inspecting the file with plain SQL.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::{debug, info};

use super::schema;

struct Migration {
    version: u32,
    label: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        label: "entities, ratings, scores",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        label: "lookup indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Schema version written by the newest migration.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// The version recorded in `PRAGMA user_version`.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read or holds a negative value.
pub fn current_schema_version(conn: &Connection) -> Result<u32> {
    let raw: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("read user_version")?;
    u32::try_from(raw).with_context(|| format!("user_version {raw} is not a schema version"))
}

/// Bring the store up to [`LATEST_SCHEMA_VERSION`] and return it.
///
/// Each upgrade commits on its own, so an interrupted run resumes from the
/// last completed step. A store written by a newer build is refused rather
/// than downgraded.
///
/// # Errors
///
/// Returns an error if the store is newer than this build or a step fails.
pub fn migrate(conn: &mut Connection) -> Result<u32> {
    let from = current_schema_version(conn)?;
    if from > LATEST_SCHEMA_VERSION {
        bail!(
            "store schema version {from} is newer than this build supports ({LATEST_SCHEMA_VERSION})"
        );
    }

    for step in MIGRATIONS.iter().filter(|m| m.version > from) {
        let version = i64::from(step.version);
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)
            .with_context(|| format!("migration {} ({})", step.version, step.label))?;
        tx.execute("UPDATE store_meta SET schema_version = ?1 WHERE id = 1", [version])?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        debug!(version = step.version, label = step.label, "migration applied");
    }

    if from < LATEST_SCHEMA_VERSION {
        info!(from, to = LATEST_SCHEMA_VERSION, "store schema upgraded");
    }
    Ok(LATEST_SCHEMA_VERSION)
}
