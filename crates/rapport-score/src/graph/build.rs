//! Graph construction from entities and rating edges.
//!
//! # Overview
//!
//! Every known entity becomes a node, every rating a directed edge
//! `rater → target` weighted by its [`RatingScore`]. Unlike a lenient
//! loader, construction refuses ratings whose endpoints are not in the
//! entity set: a dangling rating means the caller's snapshot is
//! inconsistent, and scoring it would silently shift every depth.
//!
//! ## Parallel Edges
//!
//! The store holds at most one rating per ordered pair. If the input still
//! carries two edges for the same pair, the later one replaces the earlier
//! score so the graph never holds parallel edges.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use anyhow::{Context, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rapport_core::db::query;
use rapport_core::{NodeId, RatingEdge, RatingScore};
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::ScoreError;

// ---------------------------------------------------------------------------
// RatingGraph
// ---------------------------------------------------------------------------

/// A directed rating graph.
///
/// Nodes are entity ids. An edge `A → B` means "A rated B", weighted by the
/// score A gave.
#[derive(Debug)]
pub struct RatingGraph {
    /// Directed graph: nodes = entity ids, edges = ratings.
    pub graph: DiGraph<NodeId, RatingScore>,
    /// Mapping from entity id to petgraph `NodeIndex`.
    pub node_map: HashMap<NodeId, NodeIndex>,
    /// BLAKE3 content hash of the edge set.
    pub content_hash: String,
}

impl RatingGraph {
    /// Build a graph from an entity set and the ratings between them.
    ///
    /// Duplicate entity ids are added once.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::UnknownNode`] if a rating references an entity
    /// missing from `entities`.
    #[instrument(skip_all, fields(entities = entities.len(), ratings = ratings.len()))]
    pub fn build(entities: &[NodeId], ratings: &[RatingEdge]) -> Result<Self, ScoreError> {
        let mut graph = DiGraph::<NodeId, RatingScore>::with_capacity(entities.len(), ratings.len());
        let mut node_map: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(entities.len());

        for &id in entities {
            node_map.entry(id).or_insert_with(|| graph.add_node(id));
        }

        for edge in ratings {
            let lookup = |id: NodeId| {
                node_map.get(&id).copied().ok_or(ScoreError::UnknownNode {
                    rater: edge.rater,
                    target: edge.target,
                    missing: id,
                })
            };
            let rater = lookup(edge.rater)?;
            let target = lookup(edge.target)?;

            // update_edge replaces the weight of an existing edge.
            graph.update_edge(rater, target, edge.score);
        }

        let content_hash = compute_edge_hash(&graph);
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            %content_hash,
            "rating graph built"
        );

        Ok(Self {
            graph,
            node_map,
            content_hash,
        })
    }

    /// Load entities and ratings from the store and build the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the store queries fail or the stored ratings
    /// reference unregistered entities.
    #[instrument(skip(conn))]
    pub fn from_sqlite(conn: &Connection) -> Result<Self> {
        let entities = query::load_entity_ids(conn).context("load entity ids")?;
        let ratings = query::load_ratings(conn).context("load ratings")?;
        Self::build(&entities, &ratings).context("build rating graph")
    }

    /// Return the number of nodes (entities) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges (ratings) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an entity id.
    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    /// Return the entity id stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> NodeId {
        self.graph[idx]
    }

    /// Neighbors of `idx` in `direction`, ordered by ascending entity id.
    ///
    /// `Outgoing` yields the entities `idx` rated; `Incoming` yields the
    /// entities that rated `idx`.
    #[must_use]
    pub fn neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        out.sort_unstable_by_key(|n| self.graph[*n]);
        out
    }

    /// Score carried by the edge `from → to`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::TraversalContractViolation`] if no such edge
    /// exists.
    pub fn edge_score(&self, from: NodeIndex, to: NodeIndex) -> Result<RatingScore, ScoreError> {
        self.graph
            .find_edge(from, to)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
            .ok_or_else(|| ScoreError::TraversalContractViolation {
                from: self.graph.node_weight(from).copied().unwrap_or_default(),
                to: self.graph.node_weight(to).copied().unwrap_or_default(),
            })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Compute a BLAKE3 hash of the sorted `(rater, target, score)` edge list.
fn compute_edge_hash(graph: &DiGraph<NodeId, RatingScore>) -> String {
    let mut edges: Vec<(NodeId, NodeId, i8)> = graph
        .raw_edges()
        .iter()
        .map(|e| (graph[e.source()], graph[e.target()], e.weight.get()))
        .collect();
    edges.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for (rater, target, score) in edges {
        hasher.update(&rater.to_be_bytes());
        hasher.update(&target.to_be_bytes());
        hasher.update(&score.to_be_bytes());
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_core::db::{open_in_memory, query};

    fn edge(rater: NodeId, target: NodeId, score: i64) -> RatingEdge {
        RatingEdge::new(rater, target, RatingScore::new(score).expect("score")).expect("edge")
    }

    #[test]
    fn empty_input_produces_empty_graph() {
        let graph = RatingGraph::build(&[], &[]).expect("build graph");
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn entities_without_ratings_are_nodes_only() {
        let graph = RatingGraph::build(&[1, 2, 2, 3], &[]).expect("build graph");
        assert_eq!(graph.node_count(), 3, "duplicate ids are added once");
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node_index(3).is_some());
        assert!(graph.node_index(4).is_none());
    }

    #[test]
    fn single_rating_direction() {
        let graph = RatingGraph::build(&[1, 2], &[edge(1, 2, 7)]).expect("build graph");
        let a = graph.node_index(1).expect("node 1");
        let b = graph.node_index(2).expect("node 2");

        assert!(graph.graph.contains_edge(a, b), "expected 1 → 2");
        assert!(!graph.graph.contains_edge(b, a), "no reverse edge");
        assert_eq!(graph.edge_score(a, b).expect("score").get(), 7);
        assert_eq!(graph.neighbors(a, Direction::Outgoing), vec![b]);
        assert_eq!(graph.neighbors(b, Direction::Incoming), vec![a]);
    }

    #[test]
    fn unknown_target_fails_construction() {
        let err = RatingGraph::build(&[1, 2], &[edge(1, 2, 5), edge(2, 9, 5)])
            .expect_err("dangling rating");
        assert!(matches!(
            err,
            ScoreError::UnknownNode {
                rater: 2,
                target: 9,
                missing: 9
            }
        ));
    }

    #[test]
    fn unknown_rater_fails_construction() {
        let err = RatingGraph::build(&[2], &[edge(8, 2, 5)]).expect_err("dangling rating");
        assert!(matches!(err, ScoreError::UnknownNode { missing: 8, .. }));
    }

    #[test]
    fn later_duplicate_edge_wins() {
        let graph =
            RatingGraph::build(&[1, 2], &[edge(1, 2, 3), edge(1, 2, 8)]).expect("build graph");
        assert_eq!(graph.edge_count(), 1);
        let (a, b) = (
            graph.node_index(1).expect("node 1"),
            graph.node_index(2).expect("node 2"),
        );
        assert_eq!(graph.edge_score(a, b).expect("score").get(), 8);
    }

    #[test]
    fn missing_edge_is_a_contract_violation() {
        let graph = RatingGraph::build(&[1, 2], &[edge(1, 2, 3)]).expect("build graph");
        let (a, b) = (
            graph.node_index(1).expect("node 1"),
            graph.node_index(2).expect("node 2"),
        );
        let err = graph.edge_score(b, a).expect_err("no reverse edge");
        assert!(matches!(
            err,
            ScoreError::TraversalContractViolation { from: 2, to: 1 }
        ));
    }

    #[test]
    fn neighbors_are_sorted_by_entity_id() {
        let graph = RatingGraph::build(
            &[1, 5, 3, 9],
            &[edge(1, 9, 1), edge(1, 3, 1), edge(1, 5, 1)],
        )
        .expect("build graph");
        let center = graph.node_index(1).expect("node 1");
        let ids: Vec<NodeId> = graph
            .neighbors(center, Direction::Outgoing)
            .into_iter()
            .map(|n| graph.node_id(n))
            .collect();
        assert_eq!(ids, vec![3, 5, 9]);
    }

    #[test]
    fn content_hash_tracks_scores_not_insertion_order() {
        let a = RatingGraph::build(&[1, 2, 3], &[edge(1, 2, 4), edge(2, 3, 4)]).expect("a");
        let b = RatingGraph::build(&[3, 2, 1], &[edge(2, 3, 4), edge(1, 2, 4)]).expect("b");
        let c = RatingGraph::build(&[1, 2, 3], &[edge(1, 2, 5), edge(2, 3, 4)]).expect("c");

        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash, "hash must change with scores");
    }

    #[test]
    fn from_sqlite_loads_store_contents() {
        let conn = open_in_memory().expect("store");
        for id in [1, 2, 3] {
            query::insert_entity(&conn, id, None).expect("entity");
        }
        query::upsert_rating(&conn, &edge(1, 2, 6), 0).expect("rating");
        query::upsert_rating(&conn, &edge(3, 2, 2), 0).expect("rating");

        let graph = RatingGraph::from_sqlite(&conn).expect("build graph");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let target = graph.node_index(2).expect("node 2");
        assert_eq!(graph.neighbors(target, Direction::Incoming).len(), 2);
    }
}
