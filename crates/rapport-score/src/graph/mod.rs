//! In-memory rating graph.
//!
//! ## Pipeline
//!
//! ```text
//! store entities + ratings
//!        ↓  build::RatingGraph::build() / RatingGraph::from_sqlite()
//! RatingGraph (DiGraph, may contain cycles)
//!        ↓  neighborhood::NeighborhoodExtractor
//! Neighborhood (normalized subgraph records)
//! ```
//!
//! ## Cache Invalidation
//!
//! [`RatingGraph::content_hash`] is a BLAKE3 hash of the edge set including
//! scores. Compare it against a stored value to detect rating changes.

pub mod build;

pub use build::RatingGraph;
