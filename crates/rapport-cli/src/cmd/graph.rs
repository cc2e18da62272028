//! `rp graph`: size and content hash of the rating graph.

use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use petgraph::Direction;
use rapport_score::RatingGraph;
use serde::Serialize;

use super::open_project;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct GraphArgs {}

#[derive(Debug, Serialize)]
struct GraphStats {
    entities: usize,
    ratings: usize,
    /// Entities with no rating in either direction.
    isolated: usize,
    content_hash: String,
}

impl GraphStats {
    fn of(graph: &RatingGraph) -> Self {
        let isolated = graph
            .graph
            .node_indices()
            .filter(|&idx| {
                graph.neighbors(idx, Direction::Outgoing).is_empty()
                    && graph.neighbors(idx, Direction::Incoming).is_empty()
            })
            .count();
        Self {
            entities: graph.node_count(),
            ratings: graph.edge_count(),
            isolated,
            content_hash: graph.content_hash.clone(),
        }
    }
}

pub fn run_graph(_args: &GraphArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = open_project(project_root, output)?;
    let graph = RatingGraph::from_sqlite(&project.conn).context("load rating graph")?;
    let stats = GraphStats::of(&graph);

    render_mode(
        output,
        &stats,
        |s, w| {
            writeln!(
                w,
                "entities={} ratings={} isolated={} hash={}",
                s.entities, s.ratings, s.isolated, s.content_hash
            )
        },
        |s, w| {
            pretty_section(w, "Rating graph")?;
            pretty_kv(w, "Entities", s.entities.to_string())?;
            pretty_kv(w, "Ratings", s.ratings.to_string())?;
            pretty_kv(w, "Isolated", s.isolated.to_string())?;
            pretty_kv(w, "Hash", &s.content_hash)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_core::{RatingEdge, RatingScore};

    #[test]
    fn isolated_entities_are_counted() {
        let score = RatingScore::new(5).expect("score");
        let graph = RatingGraph::build(
            &[1, 2, 3, 4],
            &[RatingEdge::new(1, 2, score).expect("edge")],
        )
        .expect("graph");
        let stats = GraphStats::of(&graph);
        assert_eq!(stats.entities, 4);
        assert_eq!(stats.ratings, 1);
        assert_eq!(stats.isolated, 2);
    }
}
