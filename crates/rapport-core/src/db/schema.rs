//! Canonical SQLite schema for the rapport store.
//!
//! - `entities` lists every rateable entity
//! - `ratings` holds one directed edge per ordered `(rater_id, target_id)` pair
//! - `entity_scores` holds fixed-point reputation scores keyed by entity
//! - `store_meta` tracks the schema version

/// Migration v1: entities, ratings, scores, and store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS entities (
    entity_id INTEGER PRIMARY KEY,
    name TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ratings (
    rater_id INTEGER NOT NULL REFERENCES entities(entity_id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES entities(entity_id) ON DELETE CASCADE,
    score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 10),
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (rater_id, target_id),
    CHECK (rater_id <> target_id)
);

CREATE TABLE IF NOT EXISTS entity_scores (
    entity_id INTEGER PRIMARY KEY,
    score INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes for incoming-edge loads and score listings.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_ratings_target
    ON ratings(target_id, rater_id);

CREATE INDEX IF NOT EXISTS idx_entity_scores_score
    ON entity_scores(score DESC);
";

/// Indexes every fully migrated store must have.
pub const REQUIRED_INDEXES: &[&str] = &["idx_ratings_target", "idx_entity_scores_score"];
