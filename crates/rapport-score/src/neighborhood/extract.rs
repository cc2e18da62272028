//! Two-pass neighborhood extraction over a [`RatingGraph`].
//!
//! # Algorithm
//!
//! ```text
//! outgoing pass  from center, depth 0,      step -1 per level
//! peak         = max depth of outgoing records (0 if none)
//! incoming pass  from center, depth = peak, step +1 per level
//! floor        = min depth of all records   (0 if none)
//! depth'       = depth - floor + 1
//! ```
//!
//! Each pass is a depth-first walk driven by an explicit stack of frames.
//! A frame holds the entity being expanded, the depth assigned to the edges
//! it discovers, and its not-yet-visited neighbors. Popping neighbors one at
//! a time from the top frame reproduces recursive depth-first order exactly,
//! so a long rating chain costs heap instead of call stack.

use petgraph::graph::NodeIndex;
use rapport_core::NodeId;
use tracing::{debug, instrument, trace};

use super::membership::{BloomFilter, Membership};
use super::{Neighborhood, Pass, SubgraphRecord};
use crate::error::ScoreError;
use crate::graph::RatingGraph;
use crate::normalize;

/// Single-use extractor: one graph, one center, two visited sets.
///
/// ```rust,ignore
/// let hood = NeighborhoodExtractor::new(&graph).extract(center)?;
/// ```
pub struct NeighborhoodExtractor<'g, M> {
    graph: &'g RatingGraph,
    outgoing_seen: M,
    incoming_seen: M,
    records: Vec<SubgraphRecord>,
}

struct Frame {
    node: NodeIndex,
    depth: i64,
    pending: std::vec::IntoIter<NodeIndex>,
}

impl Frame {
    fn open(graph: &RatingGraph, node: NodeIndex, depth: i64, pass: Pass) -> Self {
        Self {
            node,
            depth,
            pending: graph.neighbors(node, pass.direction()).into_iter(),
        }
    }
}

impl<'g> NeighborhoodExtractor<'g, BloomFilter> {
    /// Extractor using default-sized bloom filters (1000 keys, 1% false positives).
    #[must_use]
    pub fn new(graph: &'g RatingGraph) -> Self {
        Self::with_membership(graph, BloomFilter::default)
    }
}

impl<'g, M: Membership> NeighborhoodExtractor<'g, M> {
    /// Extractor whose two visited sets come from `make`.
    pub fn with_membership(graph: &'g RatingGraph, mut make: impl FnMut() -> M) -> Self {
        Self {
            graph,
            outgoing_seen: make(),
            incoming_seen: make(),
            records: Vec::new(),
        }
    }

    /// Extract and normalize the neighborhood of `center`.
    ///
    /// An entity absent from the graph has an empty neighborhood.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::TraversalContractViolation`] if a traversed
    /// neighbor has no backing edge.
    #[instrument(skip(self), fields(nodes = self.graph.node_count()))]
    pub fn extract(mut self, center: NodeId) -> Result<Neighborhood, ScoreError> {
        let Some(root) = self.graph.node_index(center) else {
            debug!(center, "center not in graph, neighborhood is empty");
            return Ok(Neighborhood::empty(center));
        };

        self.walk(root, 0, Pass::Outgoing)?;
        let outgoing_records = self.records.len();
        let peak_depth = normalize::peak_depth(&self.records);

        self.walk(root, peak_depth, Pass::Incoming)?;
        let incoming_records = self.records.len() - outgoing_records;

        let floor_depth = normalize::floor_depth(&self.records);
        normalize::rebase(&mut self.records, floor_depth);

        debug!(
            center,
            outgoing_records, incoming_records, peak_depth, floor_depth, "neighborhood extracted"
        );

        Ok(Neighborhood {
            center,
            records: self.records,
            outgoing_records,
            incoming_records,
            peak_depth,
            floor_depth,
        })
    }

    fn walk(&mut self, root: NodeIndex, baseline: i64, pass: Pass) -> Result<(), ScoreError> {
        let Self {
            graph,
            outgoing_seen,
            incoming_seen,
            records,
        } = self;
        let graph = *graph;
        let seen = match pass {
            Pass::Outgoing => outgoing_seen,
            Pass::Incoming => incoming_seen,
        };

        let mut stack = vec![Frame::open(graph, root, baseline + pass.step(), pass)];

        while let Some(frame) = stack.last_mut() {
            let Some(reached) = frame.pending.next() else {
                stack.pop();
                continue;
            };
            let (current, depth) = (frame.node, frame.depth);

            let reached_id = graph.node_id(reached);
            if seen.contains(reached_id) {
                trace!(entity = reached_id, ?pass, "already visited, pruned");
                continue;
            }
            seen.add(reached_id);

            let (from, to) = pass.orient(current, reached);
            let score = graph.edge_score(from, to)?;
            records.push(SubgraphRecord {
                from_id: graph.node_id(from),
                to_id: graph.node_id(to),
                depth,
                score,
            });

            // The closing edge of a cycle is recorded, but the center is
            // expanded only by the root frame.
            if reached != root {
                stack.push(Frame::open(graph, reached, depth + pass.step(), pass));
            }
        }

        Ok(())
    }
}
