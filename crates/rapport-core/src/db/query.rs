//! Read and write helpers for the rapport store.
//!
//! Reputation scores are persisted fixed-point: `trunc(score × SCORE_SCALE)`
//! in an `INTEGER` column, decoded back to `f64` on read.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params, types::Type};
use serde::Serialize;

use crate::model::{NodeId, RatingEdge, RatingScore, ScoreMap};

/// Fixed-point scale for persisted scores.
pub const SCORE_SCALE: f64 = 10_000.0;

/// Default row cap for [`list_scores`].
pub const DEFAULT_SCORE_LIMIT: usize = 100;

/// A registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: NodeId,
    pub name: Option<String>,
    pub created_at_us: i64,
}

/// One persisted reputation score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub entity_id: NodeId,
    pub score: f64,
    pub updated_at_us: i64,
}

/// Ordering for [`list_scores`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Current wall-clock time in microseconds.
#[must_use]
pub fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// Encode a reputation score for storage.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_score(score: f64) -> i64 {
    debug_assert!(score.is_finite(), "non-finite scores are rejected upstream");
    (score * SCORE_SCALE) as i64
}

/// Decode a stored reputation score.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn decode_score(raw: i64) -> f64 {
    raw as f64 / SCORE_SCALE
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Register an entity. Returns `false` if it already existed.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_entity(conn: &Connection, id: NodeId, name: Option<&str>) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO entities (entity_id, name, created_at_us) VALUES (?1, ?2, ?3)",
        params![id, name, now_us()],
    )?;
    Ok(inserted > 0)
}

/// Whether `id` is a registered entity.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn entity_exists(conn: &Connection, id: NodeId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM entities WHERE entity_id = ?1)",
        [id],
        |row| row.get(0),
    )
}

/// All registered entities ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_entities(conn: &Connection) -> rusqlite::Result<Vec<Entity>> {
    let mut stmt = conn.prepare(
        "SELECT entity_id, name, created_at_us FROM entities ORDER BY entity_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Entity {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at_us: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// All registered entity ids ordered ascending.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_entity_ids(conn: &Connection) -> rusqlite::Result<Vec<NodeId>> {
    let mut stmt = conn.prepare("SELECT entity_id FROM entities ORDER BY entity_id")?;
    let ids = stmt.query_map([], |row| row.get::<_, NodeId>(0))?;
    ids.collect()
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// Insert or overwrite the rating for `(edge.rater, edge.target)`.
///
/// # Errors
///
/// Returns an error if either endpoint is not a registered entity or the
/// write fails.
pub fn upsert_rating(conn: &Connection, edge: &RatingEdge, now_us: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO ratings (rater_id, target_id, score, updated_at_us)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (rater_id, target_id)
         DO UPDATE SET score = excluded.score, updated_at_us = excluded.updated_at_us",
        params![edge.rater, edge.target, i64::from(edge.score), now_us],
    )?;
    Ok(())
}

/// Load every rating edge ordered by `(rater_id, target_id)`.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row violates the rating
/// model (score out of range, self-rating).
pub fn load_ratings(conn: &Connection) -> rusqlite::Result<Vec<RatingEdge>> {
    let mut stmt = conn.prepare(
        "SELECT rater_id, target_id, score FROM ratings ORDER BY rater_id, target_id",
    )?;
    let rows = stmt.query_map([], |row| {
        let rater: NodeId = row.get(0)?;
        let target: NodeId = row.get(1)?;
        let raw_score: i64 = row.get(2)?;
        let score = RatingScore::new(raw_score).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(err))
        })?;
        RatingEdge::new(rater, target, score).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err))
        })
    })?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Upsert every entry of `scores` in a single transaction.
///
/// On conflict only the score and timestamp columns are overwritten. Either
/// every entry lands or none does.
///
/// # Errors
///
/// Returns an error if any write fails; the transaction is rolled back.
pub fn upsert_scores(conn: &mut Connection, scores: &ScoreMap, now_us: i64) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO entity_scores (entity_id, score, updated_at_us)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (entity_id)
             DO UPDATE SET score = excluded.score, updated_at_us = excluded.updated_at_us",
        )?;
        for (entity_id, score) in scores {
            stmt.execute(params![entity_id, encode_score(*score), now_us])?;
        }
    }
    tx.commit()?;
    Ok(scores.len())
}

/// Persisted score for one entity, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_score(conn: &Connection, id: NodeId) -> rusqlite::Result<Option<f64>> {
    let raw: Option<i64> = conn
        .query_row(
            "SELECT score FROM entity_scores WHERE entity_id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.map(decode_score))
}

/// Persisted scores ordered by score, ties broken by entity id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_scores(
    conn: &Connection,
    order: SortOrder,
    limit: usize,
) -> rusqlite::Result<Vec<ScoreRow>> {
    let sql = format!(
        "SELECT entity_id, score, updated_at_us FROM entity_scores
         ORDER BY score {}, entity_id ASC
         LIMIT ?1",
        order.sql()
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([limit], |row| {
        Ok(ScoreRow {
            entity_id: row.get(0)?,
            score: decode_score(row.get(1)?),
            updated_at_us: row.get(2)?,
        })
    })?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

/// Open the store at `path` if it exists and is readable.
///
/// Returns `Ok(None)` when the file is missing or not a usable store.
///
/// # Errors
///
/// Never fails today; the `Result` leaves room for fatal I/O conditions.
pub fn try_open_store(path: &std::path::Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }

    match super::open_store(path) {
        Ok(conn) => Ok(Some(conn)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to open store"
            );
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, open_store};
    use proptest::prelude::*;

    fn test_db() -> Connection {
        open_in_memory().expect("in-memory store")
    }

    fn edge(rater: NodeId, target: NodeId, score: i64) -> RatingEdge {
        RatingEdge::new(rater, target, RatingScore::new(score).expect("score")).expect("edge")
    }

    fn seed_entities(conn: &Connection, ids: &[NodeId]) {
        for id in ids {
            insert_entity(conn, *id, None).expect("insert entity");
        }
    }

    #[test]
    fn insert_entity_is_idempotent() {
        let conn = test_db();
        assert!(insert_entity(&conn, 1, Some("alice")).expect("first insert"));
        assert!(!insert_entity(&conn, 1, Some("again")).expect("second insert"));

        let entities = list_entities(&conn).expect("list");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name.as_deref(), Some("alice"));
        assert!(entity_exists(&conn, 1).expect("exists"));
        assert!(!entity_exists(&conn, 2).expect("exists"));
    }

    #[test]
    fn upsert_rating_last_write_wins() {
        let conn = test_db();
        seed_entities(&conn, &[1, 2]);

        upsert_rating(&conn, &edge(1, 2, 3), 10).expect("first");
        upsert_rating(&conn, &edge(1, 2, 9), 20).expect("second");

        let ratings = load_ratings(&conn).expect("load");
        assert_eq!(ratings, vec![edge(1, 2, 9)]);
    }

    #[test]
    fn rating_unknown_entity_fails() {
        let conn = test_db();
        seed_entities(&conn, &[1]);
        assert!(upsert_rating(&conn, &edge(1, 99, 5), 0).is_err());
    }

    #[test]
    fn load_ratings_rejects_out_of_range_rows() {
        let conn = test_db();
        seed_entities(&conn, &[1, 2]);
        conn.execute_batch(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO ratings (rater_id, target_id, score, updated_at_us) VALUES (1, 2, 42, 0);",
        )
        .expect("force bad row");
        assert!(load_ratings(&conn).is_err());
    }

    #[test]
    fn upsert_scores_overwrites_score_column() {
        let mut conn = test_db();
        let mut scores = ScoreMap::new();
        scores.insert(1, 0.5);
        scores.insert(2, 0.25);
        assert_eq!(upsert_scores(&mut conn, &scores, 1).expect("first"), 2);

        scores.insert(1, 0.75);
        upsert_scores(&mut conn, &scores, 2).expect("second");

        assert_eq!(get_score(&conn, 1).expect("get"), Some(0.75));
        assert_eq!(get_score(&conn, 2).expect("get"), Some(0.25));
        assert_eq!(get_score(&conn, 3).expect("get"), None);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM entity_scores", [], |row| row.get(0))
            .expect("count");
        assert_eq!(rows, 2);
    }

    #[test]
    fn list_scores_orders_and_limits() {
        let mut conn = test_db();
        let scores: ScoreMap = [(1, 0.1), (2, 0.9), (3, 0.5), (4, 0.5)].into_iter().collect();
        upsert_scores(&mut conn, &scores, 1).expect("upsert");

        let desc = list_scores(&conn, SortOrder::Desc, 3).expect("desc");
        let ids: Vec<NodeId> = desc.iter().map(|row| row.entity_id).collect();
        assert_eq!(ids, vec![2, 3, 4]);

        let asc = list_scores(&conn, SortOrder::Asc, DEFAULT_SCORE_LIMIT).expect("asc");
        let ids: Vec<NodeId> = asc.iter().map(|row| row.entity_id).collect();
        assert_eq!(ids, vec![1, 3, 4, 2]);
    }

    #[test]
    fn fixed_point_truncates_toward_zero() {
        assert_eq!(encode_score(0.123_456), 1234);
        assert_eq!(encode_score(-0.123_456), -1234);
        assert!((decode_score(1234) - 0.1234).abs() < 1e-12);
    }

    #[test]
    fn try_open_store_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nonexistent.db");
        let result = try_open_store(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn try_open_store_valid_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.db");
        drop(open_store(&path).expect("create"));

        let conn = try_open_store(&path).expect("no error");
        assert!(conn.is_some());
    }

    #[test]
    fn try_open_store_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corrupt.db");
        std::fs::write(&path, b"this is not a sqlite database").expect("write");

        let result = try_open_store(&path).expect("no error");
        assert!(result.is_none());
    }

    proptest! {
        #[test]
        fn fixed_point_round_trip_stays_within_one_step(score in -1.0e6_f64..1.0e6_f64) {
            let decoded = decode_score(encode_score(score));
            prop_assert!((decoded - score).abs() < 1.0 / SCORE_SCALE + 1e-9);
        }
    }
}
