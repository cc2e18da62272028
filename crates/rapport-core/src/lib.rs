#![forbid(unsafe_code)]
//! rapport-core library.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for domain failures, `anyhow::Result` at
//!   the store and config boundary.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod model;

pub use error::ErrorCode;
pub use model::{ModelError, NodeId, RatingEdge, RatingScore, ScoreMap};
