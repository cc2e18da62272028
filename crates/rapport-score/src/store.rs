//! The persistence seam.
//!
//! [`RatingStore`] is what the orchestrator needs from storage: a snapshot of
//! entities and ratings to build the graph from, a way to record a rating,
//! and an upsert for finished score maps. The SQLite implementation
//! delegates to [`rapport_core::db::query`].

use rapport_core::db::query;
use rapport_core::{NodeId, RatingEdge, ScoreMap};
use rusqlite::Connection;

/// Storage used by [`crate::ScoreOrchestrator`].
pub trait RatingStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every registered entity id.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the read fails.
    fn load_entities(&self) -> Result<Vec<NodeId>, Self::Error>;

    /// Every stored rating edge.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the read fails.
    fn load_ratings(&self) -> Result<Vec<RatingEdge>, Self::Error>;

    /// Insert or replace the rating for `edge.rater → edge.target`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    fn upsert_rating(&mut self, edge: &RatingEdge) -> Result<(), Self::Error>;

    /// Upsert every score keyed by entity id, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails; no score is changed.
    fn upsert_scores(&mut self, scores: &ScoreMap) -> Result<usize, Self::Error>;
}

impl RatingStore for Connection {
    type Error = rusqlite::Error;

    fn load_entities(&self) -> Result<Vec<NodeId>, Self::Error> {
        query::load_entity_ids(self)
    }

    fn load_ratings(&self) -> Result<Vec<RatingEdge>, Self::Error> {
        query::load_ratings(self)
    }

    fn upsert_rating(&mut self, edge: &RatingEdge) -> Result<(), Self::Error> {
        query::upsert_rating(self, edge, query::now_us())
    }

    fn upsert_scores(&mut self, scores: &ScoreMap) -> Result<usize, Self::Error> {
        query::upsert_scores(self, scores, query::now_us())
    }
}

impl<S: RatingStore + ?Sized> RatingStore for &mut S {
    type Error = S::Error;

    fn load_entities(&self) -> Result<Vec<NodeId>, Self::Error> {
        (**self).load_entities()
    }

    fn load_ratings(&self) -> Result<Vec<RatingEdge>, Self::Error> {
        (**self).load_ratings()
    }

    fn upsert_rating(&mut self, edge: &RatingEdge) -> Result<(), Self::Error> {
        (**self).upsert_rating(edge)
    }

    fn upsert_scores(&mut self, scores: &ScoreMap) -> Result<usize, Self::Error> {
        (**self).upsert_scores(scores)
    }
}
