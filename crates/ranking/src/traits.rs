//! Backend trait definitions.

use crate::error::RankingResult;
use async_trait::async_trait;
use bytes::Bytes;
use podium_core::PlayerId;
use std::time::Duration;

/// Ordered score structure keyed by player.
///
/// Ordering is `total_score` descending, ties broken by player id ascending.
/// Positions reported by `standing_of` are 0-based.
#[async_trait]
pub trait RankBackend: Send + Sync {
    /// Raise a member's score to `total_score` unless it is already at or
    /// above it, inserting the member if absent. Returns the resulting score.
    async fn raise_score(&self, player_id: PlayerId, total_score: i64) -> RankingResult<i64>;

    /// Atomically add `delta` to a member's score (absent counts as 0).
    /// Returns the new score.
    async fn incr_by(&self, player_id: PlayerId, delta: i64) -> RankingResult<i64>;

    /// 0-based position and score of a member, read together so the pair
    /// always describes the same contents.
    async fn standing_of(&self, player_id: PlayerId) -> RankingResult<Option<(u64, i64)>>;

    /// At most `k` members from the top, in order.
    async fn top(&self, k: usize) -> RankingResult<Vec<(PlayerId, i64)>>;

    /// Replace the whole contents. Concurrent readers see either the old or
    /// the new contents, never a mix.
    async fn replace_all(&self, entries: Vec<(PlayerId, i64)>) -> RankingResult<()>;

    /// Number of members.
    async fn len(&self) -> RankingResult<u64>;
}

/// Key-value store with per-key expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a live value. Expired keys read as absent.
    async fn get(&self, key: &str) -> RankingResult<Option<Bytes>>;

    /// Set a value with a time-to-live, overwriting any existing value.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> RankingResult<()>;

    /// Set a value only if the key is absent or expired.
    /// Returns whether the value was written.
    async fn set_if_absent(&self, key: &str, value: Bytes, ttl: Duration) -> RankingResult<bool>;

    /// Delete a key unconditionally. Returns whether a live value was removed.
    async fn delete(&self, key: &str) -> RankingResult<bool>;

    /// Delete a key only if it holds a live value equal to `expected`.
    async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> RankingResult<bool>;

    /// Drop expired keys. Returns how many were dropped.
    async fn purge_expired(&self) -> RankingResult<usize>;
}
