//! Bounded, cycle-safe subgraph extraction around one center entity.
//!
//! # Overview
//!
//! A neighborhood is the union of two independent depth-first passes from
//! the center:
//!
//! 1. **Outgoing pass** (descending depth): whom the center rated, whom
//!    those entities rated, and so on. Depth starts at 0 and drops by one
//!    per traversal level, so these records carry depths ≤ -1.
//! 2. **Incoming pass** (ascending depth): who rated the center, who rated
//!    them, and so on. Its baseline is the peak (closest to zero) depth of
//!    the outgoing pass, and depth rises by one per traversal level.
//!
//! Afterwards every depth is rebased so the deepest outgoing record lands on
//! 1 (see [`crate::normalize`]). Records adjacent to the center end up in the
//! middle of the scale, and depth moves away from the middle as distance from
//! the center grows.
//!
//! ## Visited sets
//!
//! Each pass owns its own [`Membership`] structure. An entity reachable in
//! both directions therefore shows up once per pass, each time with its own
//! depth. Within one pass an entity is the newly reached endpoint of at most
//! one record.
//!
//! ## Levels, not edges
//!
//! Depth changes once per traversal level: every record discovered while
//! expanding the same entity shares one depth, however many edges that
//! entity has.

pub mod extract;
pub mod membership;

pub use extract::NeighborhoodExtractor;
pub use membership::{BloomFilter, ExactSet, Membership};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use rapport_core::{NodeId, RatingScore};
use serde::{Deserialize, Serialize};

/// One rating edge reached during extraction.
///
/// `from_id → to_id` always follows the real rating direction, whichever
/// pass found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubgraphRecord {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub depth: i64,
    pub score: RatingScore,
}

/// The normalized result of one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighborhood {
    pub center: NodeId,
    /// Outgoing-pass records first, then incoming-pass records, each in
    /// depth-first discovery order.
    pub records: Vec<SubgraphRecord>,
    pub outgoing_records: usize,
    pub incoming_records: usize,
    /// Highest raw depth of the outgoing pass (0 when it found nothing).
    pub peak_depth: i64,
    /// Lowest raw depth over both passes (0 when empty).
    pub floor_depth: i64,
}

impl Neighborhood {
    pub(crate) const fn empty(center: NodeId) -> Self {
        Self {
            center,
            records: Vec::new(),
            outgoing_records: 0,
            incoming_records: 0,
            peak_depth: 0,
            floor_depth: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records found by the outgoing pass.
    #[must_use]
    pub fn outgoing(&self) -> &[SubgraphRecord] {
        &self.records[..self.outgoing_records]
    }

    /// Records found by the incoming pass.
    #[must_use]
    pub fn incoming(&self) -> &[SubgraphRecord] {
        &self.records[self.outgoing_records..]
    }
}

/// Which side of the center a pass walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    Outgoing,
    Incoming,
}

impl Pass {
    pub(crate) const fn direction(self) -> Direction {
        match self {
            Self::Outgoing => Direction::Outgoing,
            Self::Incoming => Direction::Incoming,
        }
    }

    pub(crate) const fn step(self) -> i64 {
        match self {
            Self::Outgoing => -1,
            Self::Incoming => 1,
        }
    }

    /// Orient `(current, reached)` along the real rating edge.
    pub(crate) const fn orient(self, current: NodeIndex, reached: NodeIndex) -> (NodeIndex, NodeIndex) {
        match self {
            Self::Outgoing => (current, reached),
            Self::Incoming => (reached, current),
        }
    }
}
