//! Backends that fail on demand.

use async_trait::async_trait;
use bytes::Bytes;
use podium_core::PlayerId;
use podium_ranking::{CacheBackend, RankBackend, RankingError, RankingResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Every call fails with `Unavailable`; calls are counted.
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
        Err(RankingError::Unavailable("failing backend".to_string()))
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
