//! Recompute reputation scores around an entity.
//!
//! # Pipeline
//!
//! ```text
//! store snapshot ─► RatingGraph::build ─► extract(center) ─► to_engine_nodes
//!                                                                  │
//!        store.upsert_scores ◄─ scores_from_engine ◄─ engine.score ┘
//! ```
//!
//! Every run rebuilds the graph from the current snapshot and rescores the
//! whole neighborhood. Any failure before the final upsert returns early, so
//! a run either persists its complete score map or nothing.

use rapport_core::config::{MembershipKind, ScoringConfig};
use rapport_core::{NodeId, RatingEdge};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::engine::ScoringEngine;
use crate::error::ScoreError;
use crate::graph::RatingGraph;
use crate::neighborhood::{BloomFilter, ExactSet, Neighborhood, NeighborhoodExtractor};
use crate::neighborhood::membership::{DEFAULT_CAPACITY, DEFAULT_FALSE_POSITIVE_RATE};
use crate::store::RatingStore;
use crate::translate;

// ---------------------------------------------------------------------------
// ExtractSettings
// ---------------------------------------------------------------------------

/// Visited-set choice for extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractSettings {
    pub membership: MembershipKind,
    pub filter_capacity: usize,
    pub false_positive_rate: f64,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            membership: MembershipKind::Bloom,
            filter_capacity: DEFAULT_CAPACITY,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
        }
    }
}

impl From<&ScoringConfig> for ExtractSettings {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            membership: config.membership,
            filter_capacity: config.filter_capacity,
            false_positive_rate: config.false_positive_rate,
        }
    }
}

impl ExtractSettings {
    /// Extract the neighborhood of `center` with the configured visited sets.
    ///
    /// # Errors
    ///
    /// Propagates [`ScoreError::TraversalContractViolation`].
    pub fn extract(&self, graph: &RatingGraph, center: NodeId) -> Result<Neighborhood, ScoreError> {
        match self.membership {
            MembershipKind::Bloom => NeighborhoodExtractor::with_membership(graph, || {
                BloomFilter::with_estimates(self.filter_capacity, self.false_positive_rate)
            })
            .extract(center),
            MembershipKind::Exact => {
                NeighborhoodExtractor::with_membership(graph, ExactSet::default).extract(center)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecomputeReport
// ---------------------------------------------------------------------------

/// Summary of one recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    pub center: NodeId,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub graph_hash: String,
    pub outgoing_records: usize,
    pub incoming_records: usize,
    /// Scores written to the store; 0 when the neighborhood was empty.
    pub scores_persisted: usize,
}

impl RecomputeReport {
    #[must_use]
    pub const fn records(&self) -> usize {
        self.outgoing_records + self.incoming_records
    }
}

// ---------------------------------------------------------------------------
// ScoreOrchestrator
// ---------------------------------------------------------------------------

/// Ties a [`RatingStore`] and a [`ScoringEngine`] together.
pub struct ScoreOrchestrator<S, E> {
    store: S,
    engine: E,
    settings: ExtractSettings,
}

impl<S: RatingStore, E: ScoringEngine> ScoreOrchestrator<S, E> {
    pub fn new(store: S, engine: E) -> Self {
        Self {
            store,
            engine,
            settings: ExtractSettings::default(),
        }
    }

    #[must_use]
    pub const fn with_settings(mut self, settings: ExtractSettings) -> Self {
        self.settings = settings;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Write `edge`, then rescore the neighborhood of the rated entity.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::Store`] if the write fails, otherwise whatever
    /// [`Self::recompute`] returns. A failed recompute leaves the rating
    /// written and previous scores untouched.
    pub fn record_rating(&mut self, edge: &RatingEdge) -> Result<RecomputeReport, ScoreError> {
        self.store.upsert_rating(edge).map_err(ScoreError::store)?;
        self.recompute(edge.target)
    }

    /// Rescore the neighborhood of `center` from the current store contents.
    ///
    /// # Errors
    ///
    /// Returns a [`ScoreError`] if the snapshot cannot be loaded or built
    /// into a graph, traversal breaks its contract, the engine fails, its
    /// result does not translate, or the upsert fails. Nothing is persisted
    /// in any of these cases.
    #[instrument(skip(self))]
    pub fn recompute(&mut self, center: NodeId) -> Result<RecomputeReport, ScoreError> {
        let entities = self.store.load_entities().map_err(ScoreError::store)?;
        let ratings = self.store.load_ratings().map_err(ScoreError::store)?;
        let graph = RatingGraph::build(&entities, &ratings)?;

        let hood = self.settings.extract(&graph, center)?;
        let mut report = RecomputeReport {
            center,
            graph_nodes: graph.node_count(),
            graph_edges: graph.edge_count(),
            graph_hash: graph.content_hash.clone(),
            outgoing_records: hood.outgoing_records,
            incoming_records: hood.incoming_records,
            scores_persisted: 0,
        };

        if hood.is_empty() {
            warn!(center, "neighborhood is empty, engine not invoked");
            return Ok(report);
        }

        let nodes = translate::to_engine_nodes(&hood.records);
        let raw = self.engine.score(&nodes)?;
        let scores = translate::scores_from_engine(raw)?;

        report.scores_persisted = self.store.upsert_scores(&scores).map_err(ScoreError::store)?;
        info!(
            center,
            records = report.records(),
            scores = report.scores_persisted,
            "scores recomputed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use rapport_core::{RatingScore, ScoreMap};

    use super::*;
    use crate::engine::EngineError;
    use crate::translate::EngineNode;

    #[derive(Debug, thiserror::Error)]
    #[error("fake store refused the write")]
    struct Refused;

    #[derive(Default)]
    struct MemoryStore {
        entities: Vec<NodeId>,
        ratings: Vec<RatingEdge>,
        scores: ScoreMap,
        refuse_scores: bool,
    }

    impl RatingStore for MemoryStore {
        type Error = Refused;

        fn load_entities(&self) -> Result<Vec<NodeId>, Refused> {
            Ok(self.entities.clone())
        }

        fn load_ratings(&self) -> Result<Vec<RatingEdge>, Refused> {
            Ok(self.ratings.clone())
        }

        fn upsert_rating(&mut self, edge: &RatingEdge) -> Result<(), Refused> {
            self.ratings
                .retain(|e| (e.rater, e.target) != (edge.rater, edge.target));
            self.ratings.push(*edge);
            Ok(())
        }

        fn upsert_scores(&mut self, scores: &ScoreMap) -> Result<usize, Refused> {
            if self.refuse_scores {
                return Err(Refused);
            }
            self.scores.extend(scores.iter().map(|(k, v)| (*k, *v)));
            Ok(scores.len())
        }
    }

    /// Scores every entity seen in the input by its record count.
    #[derive(Default)]
    struct CountingEngine {
        calls: Cell<usize>,
        last_input: RefCell<Vec<EngineNode>>,
    }

    impl ScoringEngine for CountingEngine {
        type Key = i64;

        fn score(&self, nodes: &[EngineNode]) -> Result<HashMap<i64, f64>, EngineError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_input.borrow_mut() = nodes.to_vec();
            let mut out = HashMap::new();
            for node in nodes {
                *out.entry(node.rater_id).or_insert(0.0) += 1.0;
                *out.entry(node.target_id).or_insert(0.0) += 1.0;
            }
            Ok(out)
        }
    }

    struct FailingEngine;

    impl ScoringEngine for FailingEngine {
        type Key = i64;

        fn score(&self, _: &[EngineNode]) -> Result<HashMap<i64, f64>, EngineError> {
            Err(EngineError::Exit {
                status: "exit status: 1".into(),
                stderr: "boom".into(),
            })
        }
    }

    struct TextEngine(&'static str);

    impl ScoringEngine for TextEngine {
        type Key = String;

        fn score(&self, _: &[EngineNode]) -> Result<HashMap<String, f64>, EngineError> {
            Ok(HashMap::from([(self.0.to_string(), 0.5)]))
        }
    }

    fn edge(rater: NodeId, target: NodeId, score: i64) -> RatingEdge {
        RatingEdge::new(rater, target, RatingScore::new(score).expect("score")).expect("edge")
    }

    fn worked_store() -> MemoryStore {
        MemoryStore {
            entities: (1..=8).collect(),
            ratings: vec![
                edge(4, 2, 5),
                edge(3, 2, 6),
                edge(2, 1, 7),
                edge(5, 1, 8),
                edge(6, 5, 9),
                edge(1, 7, 3),
                edge(7, 8, 4),
            ],
            ..MemoryStore::default()
        }
    }

    #[test]
    fn recompute_scores_the_whole_neighborhood() {
        let engine = CountingEngine::default();
        let mut orch = ScoreOrchestrator::new(worked_store(), &engine)
            .with_settings(ExtractSettings {
                membership: MembershipKind::Exact,
                ..ExtractSettings::default()
            });

        let report = orch.recompute(1).expect("recompute");
        assert_eq!(report.graph_nodes, 8);
        assert_eq!(report.graph_edges, 7);
        assert_eq!(report.outgoing_records, 2);
        assert_eq!(report.incoming_records, 5);
        assert_eq!(report.scores_persisted, 8);

        assert_eq!(engine.calls.get(), 1);
        let input = engine.last_input.borrow();
        assert_eq!(input.len(), 7);
        assert!(input.iter().all(|n| n.depth >= 1));
        assert!(input.contains(&EngineNode {
            rater_id: 6,
            target_id: 5,
            depth: 4,
            score: 9
        }));

        let stored = &orch.store().scores;
        assert_eq!(stored.get(&1), Some(&3.0), "1 appears in three records");
    }

    #[test]
    fn record_rating_writes_then_rescores_the_target() {
        let engine = CountingEngine::default();
        let mut orch = ScoreOrchestrator::new(
            MemoryStore {
                entities: vec![10, 20, 30],
                ..MemoryStore::default()
            },
            &engine,
        );

        let report = orch.record_rating(&edge(10, 20, 9)).expect("first");
        assert_eq!(report.center, 20);
        assert_eq!(report.incoming_records, 1);
        assert_eq!(report.scores_persisted, 2);

        // Overwrite: still one edge, new score reaches the engine.
        orch.record_rating(&edge(10, 20, 2)).expect("second");
        assert_eq!(orch.store().ratings.len(), 1);
        assert_eq!(engine.last_input.borrow()[0].score, 2);
        assert_eq!(engine.calls.get(), 2);
    }

    #[test]
    fn empty_neighborhood_skips_the_engine() {
        let engine = CountingEngine::default();
        let mut orch = ScoreOrchestrator::new(worked_store(), &engine);

        let report = orch.recompute(42).expect("unknown center");
        assert_eq!(report.records(), 0);
        assert_eq!(report.scores_persisted, 0);
        assert_eq!(engine.calls.get(), 0);
        assert!(orch.store().scores.is_empty());
    }

    #[test]
    fn engine_failure_persists_nothing() {
        let mut orch = ScoreOrchestrator::new(worked_store(), FailingEngine);
        let err = orch.recompute(1).expect_err("engine fails");
        assert!(matches!(err, ScoreError::EngineInvocation(_)));
        assert!(orch.store().scores.is_empty());
    }

    #[test]
    fn translation_failure_persists_nothing() {
        let mut orch = ScoreOrchestrator::new(worked_store(), TextEngine("user-1"));
        let err = orch.recompute(1).expect_err("bad key");
        assert!(matches!(err, ScoreError::EngineTranslation { .. }));
        assert!(orch.store().scores.is_empty());
    }

    #[test]
    fn text_keys_are_accepted_when_numeric() {
        let mut orch = ScoreOrchestrator::new(worked_store(), TextEngine("7"));
        orch.recompute(1).expect("recompute");
        assert_eq!(orch.store().scores.get(&7), Some(&0.5));
    }

    #[test]
    fn dangling_rating_aborts_before_scoring() {
        let engine = CountingEngine::default();
        let mut store = worked_store();
        store.ratings.push(edge(1, 99, 5));
        let mut orch = ScoreOrchestrator::new(store, &engine);

        let err = orch.recompute(1).expect_err("dangling");
        assert!(matches!(err, ScoreError::UnknownNode { missing: 99, .. }));
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn store_refusal_surfaces_as_store_error() {
        let mut store = worked_store();
        store.refuse_scores = true;
        let mut orch = ScoreOrchestrator::new(store, CountingEngine::default());

        let err = orch.recompute(1).expect_err("refused");
        assert!(matches!(err, ScoreError::Store(_)));
        assert_eq!(err.code(), rapport_core::ErrorCode::StoreWriteFailed);
    }

    #[test]
    fn bloom_and_exact_agree_on_small_graphs() {
        let graph = RatingGraph::build(
            &worked_store().entities,
            &worked_store().ratings,
        )
        .expect("graph");
        let exact = ExtractSettings {
            membership: MembershipKind::Exact,
            ..ExtractSettings::default()
        };
        let bloom = ExtractSettings::default();
        for center in 1..=8 {
            assert_eq!(
                exact.extract(&graph, center).expect("exact"),
                bloom.extract(&graph, center).expect("bloom"),
                "center {center}"
            );
        }
    }

    #[test]
    fn settings_follow_scoring_config() {
        let config = ScoringConfig {
            membership: MembershipKind::Exact,
            filter_capacity: 50,
            false_positive_rate: 0.05,
        };
        let settings = ExtractSettings::from(&config);
        assert_eq!(settings.membership, MembershipKind::Exact);
        assert_eq!(settings.filter_capacity, 50);
    }
}
