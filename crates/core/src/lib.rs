//! Core domain types and shared logic for the podium leaderboard.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Player identifiers and display-name rules
//! - Score deltas and game modes
//! - Ranked standings (top-N snapshots, cached rank entries)
//! - Service configuration

pub mod config;
pub mod error;
pub mod player;
pub mod score;
pub mod standings;

pub use error::{Error, Result};
pub use player::{PlayerId, validate_username};
pub use score::{GameMode, ScoreDelta};
pub use standings::{CachedRank, PlayerStanding, RankStatus, TopEntry, TopSnapshot};

/// Default application ceiling for a single score event.
pub const DEFAULT_MAX_SCORE_DELTA: i64 = 1_000_000;

/// Maximum username length in characters.
pub const MAX_USERNAME_LEN: usize = 64;
