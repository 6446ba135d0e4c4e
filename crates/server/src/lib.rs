//! HTTP service and leaderboard engine for podium.
//!
//! This crate provides:
//! - Score submission with post-commit projection hooks
//! - Layered top-N and rank reads (result cache, rank index, durable store)
//! - The leased top-N refresh loop and rank index reconciliation
//! - The HTTP API, Prometheus metrics, and the `podiumd` binary

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod leaderboard;
pub mod lease;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod tasks;

pub use error::ApiError;
pub use leaderboard::{Leaderboard, LeaderboardError, LeaderboardResult};
pub use routes::create_router;
pub use state::AppState;
