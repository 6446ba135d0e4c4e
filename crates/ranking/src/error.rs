//! Ranking and cache layer error types.

use thiserror::Error;

/// Errors raised by the ordered-structure and cache backends.
///
/// These are projection failures. The durable store stays authoritative, so
/// callers on the write path log them instead of failing the request.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("score overflow for player {player_id}")]
    Overflow { player_id: i64 },
}

/// Result type for ranking operations.
pub type RankingResult<T> = std::result::Result<T, RankingError>;
