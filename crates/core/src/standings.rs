//! Ranked standings as served to readers.

use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One row of a top-N list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopEntry {
    /// 1-based position.
    pub rank: u64,
    pub player_id: PlayerId,
    pub username: String,
    pub total_score: i64,
}

/// Cached top-N list with its generation time.
///
/// Advisory only: it may lag the durable totals by up to one TTL window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSnapshot {
    pub entries: Vec<TopEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl TopSnapshot {
    /// Build a snapshot from rows already sorted by score descending,
    /// assigning consecutive ranks starting at 1.
    pub fn from_sorted(rows: impl IntoIterator<Item = (PlayerId, String, i64)>) -> Self {
        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(i, (player_id, username, total_score))| TopEntry {
                rank: i as u64 + 1,
                player_id,
                username,
                total_score,
            })
            .collect();
        Self {
            entries,
            generated_at: OffsetDateTime::now_utc(),
        }
    }

    /// Copy of this snapshot holding at most `n` entries.
    pub fn truncated(&self, n: usize) -> Self {
        Self {
            entries: self.entries.iter().take(n).cloned().collect(),
            generated_at: self.generated_at,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-player cached (rank, total) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRank {
    pub rank: u64,
    pub total_score: i64,
}

/// Whether a player appears on the leaderboard yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankStatus {
    Ranked,
    /// The player exists but has never submitted a score.
    NoScore,
}

/// Answer to "where does player X rank".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub rank: Option<u64>,
    pub total_score: i64,
    pub status: RankStatus,
}

impl PlayerStanding {
    pub fn ranked(player_id: PlayerId, cached: CachedRank) -> Self {
        Self {
            player_id,
            rank: Some(cached.rank),
            total_score: cached.total_score,
            status: RankStatus::Ranked,
        }
    }

    pub fn unscored(player_id: PlayerId) -> Self {
        Self {
            player_id,
            rank: None,
            total_score: 0,
            status: RankStatus::NoScore,
        }
    }
}
