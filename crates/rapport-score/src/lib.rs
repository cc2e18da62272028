#![forbid(unsafe_code)]
//! rapport-score library.
//!
//! # Conventions
//!
//! - **Errors**: [`ScoreError`] for pipeline failures; each variant maps to a
//!   stable [`rapport_core::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod engine;
pub mod error;
pub mod graph;
pub mod neighborhood;
pub mod normalize;
pub mod orchestrate;
pub mod store;
pub mod translate;

pub use engine::{CommandEngine, EngineError, ScoringEngine};
pub use error::ScoreError;
pub use graph::RatingGraph;
pub use neighborhood::{Neighborhood, NeighborhoodExtractor, SubgraphRecord};
pub use orchestrate::{ExtractSettings, RecomputeReport, ScoreOrchestrator};
pub use store::RatingStore;
pub use translate::{EngineKey, EngineNode};
