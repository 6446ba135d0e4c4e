//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
///
/// Every variant is a validation failure: malformed or out-of-range input
/// that must not be retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid player id: {0}")]
    InvalidPlayerId(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("invalid score delta: {delta} (must be between 0 and {max})")]
    InvalidDelta { delta: i64, max: i64 },

    #[error("invalid game mode: {0}")]
    InvalidMode(String),

    #[error("invalid limit: {limit} (must be between 1 and {max})")]
    InvalidLimit { limit: u32, max: u32 },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
