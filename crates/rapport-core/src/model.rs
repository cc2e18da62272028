//! Rating graph domain types.
//!
//! A rating is a directed edge `rater → target` carrying a small bounded
//! integer score. Reputation scores produced from the graph are plain `f64`
//! values keyed by [`NodeId`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a rateable entity.
pub type NodeId = i64;

/// Reputation scores keyed by entity id.
///
/// Ordered so persistence and rendering walk entities deterministically.
pub type ScoreMap = BTreeMap<NodeId, f64>;

/// Errors raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Score outside [`RatingScore::MIN`]..=[`RatingScore::MAX`].
    #[error("rating score {value} out of range {min}..={max}")]
    ScoreOutOfRange { value: i64, min: i8, max: i8 },

    /// An entity tried to rate itself.
    #[error("entity {0} cannot rate itself")]
    SelfRating(NodeId),
}

impl ModelError {
    #[must_use]
    pub const fn code(&self) -> crate::ErrorCode {
        match self {
            Self::ScoreOutOfRange { .. } => crate::ErrorCode::ScoreOutOfRange,
            Self::SelfRating(_) => crate::ErrorCode::SelfRating,
        }
    }
}

// ---------------------------------------------------------------------------
// RatingScore
// ---------------------------------------------------------------------------

/// A validated rating score in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RatingScore(i8);

impl RatingScore {
    /// Lowest accepted score.
    pub const MIN: i8 = 1;
    /// Highest accepted score.
    pub const MAX: i8 = 10;

    /// Validate `value` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ScoreOutOfRange`] when `value` is outside
    /// `1..=10`.
    pub fn new(value: i64) -> Result<Self, ModelError> {
        i8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ModelError::ScoreOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
    }

    #[must_use]
    pub const fn get(self) -> i8 {
        self.0
    }
}

impl TryFrom<i64> for RatingScore {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingScore> for i64 {
    fn from(score: RatingScore) -> Self {
        Self::from(score.0)
    }
}

impl fmt::Display for RatingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RatingEdge
// ---------------------------------------------------------------------------

/// A directed rating `rater → target`.
///
/// At most one edge exists per ordered pair; writers upsert on the pair so
/// the last write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingEdge {
    pub rater: NodeId,
    pub target: NodeId,
    pub score: RatingScore,
}

impl RatingEdge {
    /// Build an edge, rejecting self-ratings.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SelfRating`] when `rater == target`.
    pub const fn new(rater: NodeId, target: NodeId, score: RatingScore) -> Result<Self, ModelError> {
        if rater == target {
            return Err(ModelError::SelfRating(rater));
        }
        Ok(Self {
            rater,
            target,
            score,
        })
    }
}

impl fmt::Display for RatingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} ({})", self.rater, self.target, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bounds_are_inclusive() {
        assert_eq!(RatingScore::new(1).map(RatingScore::get), Ok(1));
        assert_eq!(RatingScore::new(10).map(RatingScore::get), Ok(10));
        assert!(RatingScore::new(0).is_err());
        assert!(RatingScore::new(11).is_err());
        assert!(RatingScore::new(-3).is_err());
    }

    #[test]
    fn score_rejects_values_wider_than_i8() {
        let err = RatingScore::new(i64::from(i8::MAX) + 200).expect_err("out of range");
        assert!(matches!(err, ModelError::ScoreOutOfRange { value: 327, .. }));
    }

    #[test]
    fn self_rating_is_rejected() {
        let score = RatingScore::new(5).expect("valid score");
        assert_eq!(
            RatingEdge::new(7, 7, score),
            Err(ModelError::SelfRating(7))
        );
        assert!(RatingEdge::new(7, 8, score).is_ok());
    }

    #[test]
    fn model_errors_carry_stable_codes() {
        let range = RatingScore::new(0).expect_err("zero");
        assert_eq!(range.code().code(), "E2002");
        assert_eq!(ModelError::SelfRating(1).code().code(), "E2003");
    }

    #[test]
    fn score_serde_validates_on_deserialize() {
        let ok: RatingScore = serde_json::from_str("4").expect("deserialize");
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<RatingScore>("42").is_err());
    }

    #[test]
    fn edge_display_is_readable() {
        let edge = RatingEdge::new(1, 2, RatingScore::new(9).expect("score")).expect("edge");
        assert_eq!(edge.to_string(), "1 → 2 (9)");
    }
}
