//! HTTP request handlers.

pub mod common;
pub mod health;
pub mod leaderboard;
pub mod players;

pub use common::*;
pub use health::*;
pub use leaderboard::*;
pub use players::*;
