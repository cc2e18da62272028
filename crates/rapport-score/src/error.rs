//! Failures of the scoring pipeline.
//!
//! Construction, traversal, and translation errors abort a recomputation
//! before anything is persisted.

use rapport_core::{ErrorCode, NodeId};

use crate::engine::EngineError;

/// Errors raised while building, walking, or scoring a rating graph.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// A rating edge references an entity that is not in the node set.
    #[error("rating {rater} → {target} references unknown entity {missing}")]
    UnknownNode {
        rater: NodeId,
        target: NodeId,
        missing: NodeId,
    },

    /// Traversal asked for an edge the graph does not hold.
    #[error("traversal contract violated: no edge {from} → {to} in graph")]
    TraversalContractViolation { from: NodeId, to: NodeId },

    /// The engine returned a result this crate cannot map back onto entities.
    #[error("engine result unusable for key {key:?}: {reason}")]
    EngineTranslation { key: String, reason: String },

    /// The engine call itself failed.
    #[error("scoring engine failed: {0}")]
    EngineInvocation(#[from] EngineError),

    /// The persistence collaborator failed.
    #[error("rating store failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ScoreError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownNode { .. } => ErrorCode::UnknownGraphNode,
            Self::TraversalContractViolation { .. } => ErrorCode::TraversalContractViolation,
            Self::EngineTranslation { .. } => ErrorCode::EngineTranslationFailed,
            Self::EngineInvocation(_) => ErrorCode::EngineInvocationFailed,
            Self::Store(_) => ErrorCode::StoreWriteFailed,
        }
    }

    pub(crate) fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_node_message_names_the_missing_endpoint() {
        let err = ScoreError::UnknownNode {
            rater: 1,
            target: 9,
            missing: 9,
        };
        assert_eq!(err.to_string(), "rating 1 → 9 references unknown entity 9");
        assert_eq!(err.code(), ErrorCode::UnknownGraphNode);
    }

    #[test]
    fn store_errors_keep_their_source() {
        let err = ScoreError::store(rusqlite::Error::InvalidQuery);
        assert_eq!(err.code(), ErrorCode::StoreWriteFailed);
        assert!(std::error::Error::source(&err).is_some());
    }
}
