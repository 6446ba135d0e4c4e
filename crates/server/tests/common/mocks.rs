//! Test doubles for the projection backends and the durable store.

use async_trait::async_trait;
use bytes::Bytes;
use podium_core::PlayerId;
use podium_ranking::{CacheBackend, RankBackend, RankingError, RankingResult};
use podium_store::models::{AggregateRow, LeaseRow, PlayerRow, ScoreEventRow, StandingRow};
use podium_store::repos::{LeaseRepo, PlayerRepo, ScoreRepo, StandingsRepo};
use podium_store::{DurableStore, NewScoreEvent, ScoreReceipt, StoreError, StoreResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Projection backend that is down: every call fails with `Unavailable`.
#[allow(dead_code)]
pub struct FailingBackend {
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FailingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> RankingResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RankingError::Unavailable("backend offline".to_string()))
    }
}

#[async_trait]
impl RankBackend for FailingBackend {
    async fn raise_score(&self, _player_id: PlayerId, _total_score: i64) -> RankingResult<i64> {
        self.fail()
    }

    async fn incr_by(&self, _player_id: PlayerId, _delta: i64) -> RankingResult<i64> {
        self.fail()
    }

    async fn standing_of(&self, _player_id: PlayerId) -> RankingResult<Option<(u64, i64)>> {
        self.fail()
    }

    async fn top(&self, _k: usize) -> RankingResult<Vec<(PlayerId, i64)>> {
        self.fail()
    }

    async fn replace_all(&self, _entries: Vec<(PlayerId, i64)>) -> RankingResult<()> {
        self.fail()
    }

    async fn len(&self) -> RankingResult<u64> {
        self.fail()
    }
}

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> RankingResult<Option<Bytes>> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> RankingResult<()> {
        self.fail()
    }

    async fn set_if_absent(
        &self,
        _key: &str,
        _value: Bytes,
        _ttl: Duration,
    ) -> RankingResult<bool> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> RankingResult<bool> {
        self.fail()
    }

    async fn delete_if_eq(&self, _key: &str, _expected: &[u8]) -> RankingResult<bool> {
        self.fail()
    }

    async fn purge_expired(&self) -> RankingResult<usize> {
        self.fail()
    }
}

/// Durable store wrapper that can sleep before every `record_score` and
/// fail a number of `all_totals` scans before recovering.
#[allow(dead_code)]
pub struct FlakyStore {
    inner: Arc<dyn DurableStore>,
    delay: Duration,
    failing_scans: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn slow(inner: Arc<dyn DurableStore>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delay,
            failing_scans: AtomicUsize::new(0),
        })
    }

    pub fn failing_scans(inner: Arc<dyn DurableStore>, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delay: Duration::ZERO,
            failing_scans: AtomicUsize::new(failures),
        })
    }

    pub fn remaining_scan_failures(&self) -> usize {
        self.failing_scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayerRepo for FlakyStore {
    async fn create_player(&self, username: &str) -> StoreResult<PlayerRow> {
        self.inner.create_player(username).await
    }

    async fn get_player(&self, player_id: PlayerId) -> StoreResult<Option<PlayerRow>> {
        self.inner.get_player(player_id).await
    }

    async fn get_players(&self, player_ids: &[PlayerId]) -> StoreResult<Vec<PlayerRow>> {
        self.inner.get_players(player_ids).await
    }
}

#[async_trait]
impl ScoreRepo for FlakyStore {
    async fn record_score(&self, event: &NewScoreEvent) -> StoreResult<ScoreReceipt> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.record_score(event).await
    }

    async fn list_score_events(
        &self,
        player_id: PlayerId,
        limit: u32,
    ) -> StoreResult<Vec<ScoreEventRow>> {
        self.inner.list_score_events(player_id, limit).await
    }
}

#[async_trait]
impl StandingsRepo for FlakyStore {
    async fn get_aggregate(&self, player_id: PlayerId) -> StoreResult<Option<AggregateRow>> {
        self.inner.get_aggregate(player_id).await
    }

    async fn top_standings(&self, limit: u32) -> StoreResult<Vec<StandingRow>> {
        self.inner.top_standings(limit).await
    }

    async fn count_ranked_ahead(&self, total_score: i64, player_id: PlayerId) -> StoreResult<u64> {
        self.inner.count_ranked_ahead(total_score, player_id).await
    }

    async fn all_totals(&self) -> StoreResult<Vec<(PlayerId, i64)>> {
        let outage = self
            .failing_scans
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if outage {
            return Err(StoreError::Internal("aggregate scan unavailable".to_string()));
        }
        self.inner.all_totals().await
    }

    async fn recompute_advisory_ranks(&self) -> StoreResult<u64> {
        self.inner.recompute_advisory_ranks().await
    }
}

#[async_trait]
impl LeaseRepo for FlakyStore {
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        expires_at_ms: i64,
        now_ms: i64,
    ) -> StoreResult<bool> {
        self.inner
            .try_acquire_lease(name, holder, expires_at_ms, now_ms)
            .await
    }

    async fn release_lease(&self, name: &str, holder: &str) -> StoreResult<bool> {
        self.inner.release_lease(name, holder).await
    }

    async fn get_lease(&self, name: &str) -> StoreResult<Option<LeaseRow>> {
        self.inner.get_lease(name).await
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn migrate(&self) -> StoreResult<()> {
        self.inner.migrate().await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
}
