//! Leaderboard operation errors.

use podium_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a leaderboard operation as seen by its caller.
///
/// Projection (rank index, result cache) failures never appear here; they are
/// logged and reconciled later.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Malformed or out-of-range input. Not retryable.
    #[error("validation failed: {0}")]
    Validation(#[from] podium_core::Error),

    #[error("not found: {0}")]
    NotFound(String),

    /// The durable call exceeded its bound and was abandoned. The commit may
    /// or may not have landed.
    #[error("durable store did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The write violates a uniqueness or integrity constraint. Retrying the
    /// same request fails the same way.
    #[error("conflict: {0}")]
    Conflict(StoreError),

    #[error("durable store error: {0}")]
    Store(StoreError),
}

impl LeaderboardError {
    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Store(_))
    }
}

impl From<StoreError> for LeaderboardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            err @ (StoreError::AlreadyExists(_) | StoreError::Constraint(_)) => Self::Conflict(err),
            other => Self::Store(other),
        }
    }
}

/// Result type for leaderboard operations.
pub type LeaderboardResult<T> = std::result::Result<T, LeaderboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_becomes_not_found() {
        let err = LeaderboardError::from(StoreError::NotFound("player 9 not found".to_string()));
        assert!(matches!(err, LeaderboardError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeout_is_retryable_and_validation_is_not() {
        assert!(LeaderboardError::Timeout(Duration::from_millis(5)).is_retryable());
        let invalid = podium_core::ScoreDelta::new(-1, 10).unwrap_err();
        assert!(!LeaderboardError::from(invalid).is_retryable());
    }

    #[test]
    fn constraint_violations_are_conflicts_and_not_retryable() {
        for store_err in [
            StoreError::Constraint("total_score must be non-negative".to_string()),
            StoreError::AlreadyExists("player 'ada'".to_string()),
        ] {
            let err = LeaderboardError::from(store_err);
            assert!(matches!(err, LeaderboardError::Conflict(_)));
            assert!(!err.is_retryable());
        }

        let outage = LeaderboardError::from(StoreError::Internal("pool closed".to_string()));
        assert!(matches!(outage, LeaderboardError::Store(_)));
        assert!(outage.is_retryable());
    }
}
