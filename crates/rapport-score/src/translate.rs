//! Conversion between neighborhood records and the scoring engine's formats.
//!
//! Outbound, each [`SubgraphRecord`] becomes an [`EngineNode`] with the same
//! endpoints and score, widened to the engine's integer width. Inbound, the
//! engine's result keys are converted back to [`NodeId`] through
//! [`EngineKey`]. A key that does not convert is a broken contract between
//! this crate and the engine and fails the whole translation; nothing is
//! defaulted or skipped.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use rapport_core::{NodeId, RatingScore, ScoreMap};
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::neighborhood::SubgraphRecord;

/// One record in the engine's input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineNode {
    pub rater_id: i64,
    pub target_id: i64,
    pub depth: i64,
    pub score: i64,
}

impl From<&SubgraphRecord> for EngineNode {
    fn from(record: &SubgraphRecord) -> Self {
        Self {
            rater_id: record.from_id,
            target_id: record.to_id,
            depth: record.depth,
            score: i64::from(record.score.get()),
        }
    }
}

/// Translate normalized records into engine input, preserving order.
#[must_use]
pub fn to_engine_nodes(records: &[SubgraphRecord]) -> Vec<EngineNode> {
    records.iter().map(EngineNode::from).collect()
}

/// Translate engine input back into records.
///
/// # Errors
///
/// Returns [`ScoreError::EngineTranslation`] if a widened score no longer
/// fits the rating range.
pub fn to_subgraph_records(nodes: &[EngineNode]) -> Result<Vec<SubgraphRecord>, ScoreError> {
    nodes
        .iter()
        .map(|node| {
            let score =
                RatingScore::new(node.score).map_err(|err| ScoreError::EngineTranslation {
                    key: format!("{}→{}", node.rater_id, node.target_id),
                    reason: err.to_string(),
                })?;
            Ok(SubgraphRecord {
                from_id: node.rater_id,
                to_id: node.target_id,
                depth: node.depth,
                score,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Result keys
// ---------------------------------------------------------------------------

/// A key type an engine may use in its result map.
pub trait EngineKey: Eq + Hash + Debug {
    /// Checked conversion to an entity id; `Err` carries the reason.
    fn to_node_id(&self) -> Result<NodeId, String>;
}

impl EngineKey for i64 {
    fn to_node_id(&self) -> Result<NodeId, String> {
        Ok(*self)
    }
}

impl EngineKey for u64 {
    fn to_node_id(&self) -> Result<NodeId, String> {
        NodeId::try_from(*self).map_err(|err| err.to_string())
    }
}

impl EngineKey for String {
    fn to_node_id(&self) -> Result<NodeId, String> {
        self.trim()
            .parse::<NodeId>()
            .map_err(|err| format!("not an entity id: {err}"))
    }
}

/// Map an engine result back onto entity ids.
///
/// # Errors
///
/// Returns [`ScoreError::EngineTranslation`] if a key does not convert, two
/// keys convert to the same entity, or a score is not finite.
pub fn scores_from_engine<K: EngineKey>(raw: HashMap<K, f64>) -> Result<ScoreMap, ScoreError> {
    let mut scores = ScoreMap::new();
    for (key, score) in raw {
        let id = key
            .to_node_id()
            .map_err(|reason| ScoreError::EngineTranslation {
                key: format!("{key:?}"),
                reason,
            })?;
        if !score.is_finite() {
            return Err(ScoreError::EngineTranslation {
                key: format!("{key:?}"),
                reason: format!("score {score} is not finite"),
            });
        }
        if scores.insert(id, score).is_some() {
            return Err(ScoreError::EngineTranslation {
                key: format!("{key:?}"),
                reason: format!("entity {id} appears under more than one key"),
            });
        }
    }
    Ok(scores)
}
