//! Leases stored in the durable store, shared by every instance on one database.

use async_trait::async_trait;
use podium_ranking::{Lease, LeaseProvider, RankingError, RankingResult};
use podium_store::repos::LeaseRepo;
use podium_store::{DurableStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

pub struct StoreLeaseProvider {
    store: Arc<dyn DurableStore>,
}

impl StoreLeaseProvider {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }
}

fn now_unix_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn unavailable(err: StoreError) -> RankingError {
    RankingError::Unavailable(format!("lease store: {err}"))
}

#[async_trait]
impl LeaseProvider for StoreLeaseProvider {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> RankingResult<Option<Lease>> {
        let lease = Lease::new(name, ttl);
        let now_ms = now_unix_ms();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let acquired = self
            .store
            .try_acquire_lease(name, lease.token(), now_ms.saturating_add(ttl_ms), now_ms)
            .await
            .map_err(unavailable)?;
        Ok(acquired.then_some(lease))
    }

    async fn release(&self, lease: &Lease) -> RankingResult<bool> {
        self.store
            .release_lease(lease.name(), lease.token())
            .await
            .map_err(unavailable)
    }
}
