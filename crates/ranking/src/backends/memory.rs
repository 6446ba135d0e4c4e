//! In-process backend for single-instance deployments and tests.

use super::ordered::OrderedScores;
use crate::error::{RankingError, RankingResult};
use crate::traits::{CacheBackend, RankBackend};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use podium_core::PlayerId;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Ordered scores behind a `RwLock` plus a `DashMap` key-value store.
///
/// Critical sections never await, so a std lock is enough.
pub struct MemoryBackend {
    scores: RwLock<OrderedScores>,
    entries: DashMap<String, CacheEntry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            scores: RwLock::new(OrderedScores::new()),
            entries: DashMap::new(),
        }
    }

    fn read_scores(&self) -> RwLockReadGuard<'_, OrderedScores> {
        self.scores.read().unwrap_or_else(|poisoned| {
            tracing::warn!("scores RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    fn write_scores(&self) -> RwLockWriteGuard<'_, OrderedScores> {
        self.scores.write().unwrap_or_else(|poisoned| {
            tracing::warn!("scores RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RankBackend for MemoryBackend {
    async fn raise_score(&self, player_id: PlayerId, total_score: i64) -> RankingResult<i64> {
        Ok(self.write_scores().raise(player_id, total_score))
    }

    async fn incr_by(&self, player_id: PlayerId, delta: i64) -> RankingResult<i64> {
        let mut scores = self.write_scores();
        let current = scores.score_of(player_id).unwrap_or(0);
        let updated = current
            .checked_add(delta)
            .ok_or(RankingError::Overflow {
                player_id: player_id.get(),
            })?;
        scores.upsert(player_id, updated);
        Ok(updated)
    }

    async fn standing_of(&self, player_id: PlayerId) -> RankingResult<Option<(u64, i64)>> {
        let scores = self.read_scores();
        let Some(total_score) = scores.score_of(player_id) else {
            return Ok(None);
        };
        Ok(scores
            .rank_of(player_id)
            .map(|position| (position as u64, total_score)))
    }

    async fn top(&self, k: usize) -> RankingResult<Vec<(PlayerId, i64)>> {
        Ok(self.read_scores().top(k))
    }

    async fn replace_all(&self, entries: Vec<(PlayerId, i64)>) -> RankingResult<()> {
        // Build outside the lock; writers only block for the swap.
        let rebuilt = OrderedScores::from_entries(entries);
        *self.write_scores() = rebuilt;
        Ok(())
    }

    async fn len(&self) -> RankingResult<u64> {
        Ok(self.read_scores().len() as u64)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> RankingResult<Option<Bytes>> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        // The shard guard is released by now, so removing cannot deadlock.
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> RankingResult<()> {
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Bytes, ttl: Duration) -> RankingResult<bool> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return Ok(false);
                }
                occupied.insert(CacheEntry::new(value, ttl));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> RankingResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> RankingResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove_if(key, |_, entry| {
                entry.is_live(now) && entry.value.as_ref() == expected
            })
            .is_some())
    }

    async fn purge_expired(&self) -> RankingResult<usize> {
        let now = Instant::now();
        let mut purged = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_live(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pid(raw: i64) -> PlayerId {
        PlayerId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn incr_by_starts_from_zero() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.incr_by(pid(1), 100).await.unwrap(), 100);
        assert_eq!(backend.incr_by(pid(1), 200).await.unwrap(), 300);
        assert_eq!(backend.standing_of(pid(1)).await.unwrap(), Some((0, 300)));
    }

    #[tokio::test]
    async fn incr_by_reports_overflow_without_mutating() {
        let backend = MemoryBackend::new();
        backend.raise_score(pid(1), i64::MAX - 1).await.unwrap();

        let err = backend.incr_by(pid(1), 5).await.unwrap_err();
        assert!(matches!(err, RankingError::Overflow { player_id: 1 }));
        assert_eq!(
            backend.standing_of(pid(1)).await.unwrap(),
            Some((0, i64::MAX - 1))
        );
    }

    #[tokio::test]
    async fn replace_all_drops_previous_members() {
        let backend = MemoryBackend::new();
        backend.raise_score(pid(1), 10).await.unwrap();
        backend
            .replace_all(vec![(pid(2), 5), (pid(3), 7)])
            .await
            .unwrap();

        assert_eq!(backend.len().await.unwrap(), 2);
        assert_eq!(backend.standing_of(pid(1)).await.unwrap(), None);
        assert_eq!(backend.standing_of(pid(3)).await.unwrap(), Some((0, 7)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn standing_pairs_position_with_the_score_it_was_ranked_by() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .replace_all(vec![(pid(1), 100), (pid(2), 50)])
            .await
            .unwrap();

        // Player 2 keeps climbing past player 1 while readers sample its
        // standing. Every sample must be internally consistent.
        let writer = {
            let backend = backend.clone();
            tokio::spawn(async move {
                for score in 51..=200 {
                    backend.raise_score(pid(2), score).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..200 {
            let (position, score) = backend.standing_of(pid(2)).await.unwrap().unwrap();
            let expected = if score > 100 { 0 } else { 1 };
            assert_eq!(position, expected, "score {score} ranked at {position}");
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        assert_eq!(backend.standing_of(pid(2)).await.unwrap(), Some((0, 200)));
        assert_eq!(backend.standing_of(pid(1)).await.unwrap(), Some((1, 100)));
    }

    #[tokio::test]
    async fn expired_keys_read_as_absent() {
        let backend = MemoryBackend::new();
        backend
            .set("k", Bytes::from_static(b"v"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(!backend.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn set_if_absent_takes_over_expired_key() {
        let backend = MemoryBackend::new();
        let long = Duration::from_secs(60);

        let a = Bytes::from_static(b"a");
        let b = Bytes::from_static(b"b");
        let c = Bytes::from_static(b"c");

        assert!(backend.set_if_absent("lock", a, Duration::ZERO).await.unwrap());
        assert!(backend.set_if_absent("lock", b.clone(), long).await.unwrap());
        assert!(!backend.set_if_absent("lock", c, long).await.unwrap());
        assert_eq!(backend.get("lock").await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn delete_if_eq_checks_value() {
        let backend = MemoryBackend::new();
        let ttl = Duration::from_secs(60);
        backend
            .set("lock", Bytes::from_static(b"owner"), ttl)
            .await
            .unwrap();

        assert!(!backend.delete_if_eq("lock", b"intruder").await.unwrap());
        assert!(backend.delete_if_eq("lock", b"owner").await.unwrap());
        assert!(!backend.delete_if_eq("lock", b"owner").await.unwrap());
    }

    #[tokio::test]
    async fn purge_expired_counts_dropped_keys() {
        let backend = MemoryBackend::new();
        for key in ["stale-1", "stale-2"] {
            backend.set(key, Bytes::new(), Duration::ZERO).await.unwrap();
        }
        backend
            .set("fresh", Bytes::new(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.purge_expired().await.unwrap(), 2);
        assert!(backend.get("fresh").await.unwrap().is_some());
    }
}
