//! Single-writer top-N refresh and rank index reconciliation.

use crate::metrics;
use podium_core::TopSnapshot;
use podium_core::config::AppConfig;
use podium_ranking::{LeaseProvider, RankIndex, RankingError, ResultCache, with_lease};
use podium_store::repos::StandingsRepo;
use podium_store::{DurableStore, StoreError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Lease guarding the cluster-wide top-N recomputation.
pub const REFRESH_LEASE: &str = "podium:refresh:top-n";

/// Lease guarding the advisory rank column rewrite.
pub const RECONCILE_LEASE: &str = "podium:reconcile";

/// Coordinator position within one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    LockAttempt,
    Refreshing,
    LockFailed,
}

/// Result of one refresh tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// This instance held the lease and wrote a fresh snapshot.
    Refreshed { entries: usize },
    /// Another holder has the lease.
    Skipped,
    /// The lease was taken but the recompute failed, or the lease backend
    /// was unreachable.
    Failed,
}

impl TickOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Refreshed { .. } => "refreshed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("durable store error: {0}")]
    Store(#[from] StoreError),

    #[error("projection error: {0}")]
    Projection(#[from] RankingError),
}

/// Periodic writer of the cached top-N snapshot.
///
/// Each tick takes an expiring lease; only the holder recomputes, so at most
/// one instance sharing the lease backend does the work per tick. The lease
/// is released on every exit path and self-expires if the holder dies.
pub struct RefreshCoordinator {
    store: Arc<dyn DurableStore>,
    index: RankIndex,
    cache: ResultCache,
    leases: Arc<dyn LeaseProvider>,
    snapshot_size: u32,
    lease_ttl: Duration,
    reconcile_lease_ttl: Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn DurableStore>,
        index: RankIndex,
        cache: ResultCache,
        leases: Arc<dyn LeaseProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            index,
            cache,
            leases,
            snapshot_size: config.cache.snapshot_size,
            lease_ttl: config.refresh.lease_ttl(),
            reconcile_lease_ttl: config.refresh.reconcile_interval(),
            state: Mutex::new(RefreshState::Idle),
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.lock_state()
    }

    /// Run one refresh tick.
    pub async fn tick(&self) -> TickOutcome {
        let started = Instant::now();
        self.set_state(RefreshState::LockAttempt);

        let result = with_lease(
            self.leases.as_ref(),
            REFRESH_LEASE,
            self.lease_ttl,
            move || async move {
                self.set_state(RefreshState::Refreshing);
                self.refresh_top_n().await
            },
        )
        .await;

        let outcome = match result {
            Ok(Some(Ok(entries))) => {
                tracing::debug!(entries = entries, "Top-N snapshot refreshed");
                TickOutcome::Refreshed { entries }
            }
            Ok(Some(Err(e))) => {
                tracing::error!(error = %e, "Top-N refresh failed");
                TickOutcome::Failed
            }
            Ok(None) => {
                self.set_state(RefreshState::LockFailed);
                tracing::debug!("Refresh lease held by another instance; skipping tick");
                TickOutcome::Skipped
            }
            Err(e) => {
                self.set_state(RefreshState::LockFailed);
                tracing::warn!(error = %e, "Refresh lease backend unavailable; skipping tick");
                TickOutcome::Failed
            }
        };

        self.set_state(RefreshState::Idle);
        metrics::record_refresh_tick(outcome.label(), started.elapsed());
        outcome
    }

    /// Recompute the top-N from the durable store and write it to the cache.
    /// Fetched rows are also pushed into the rank index.
    async fn refresh_top_n(&self) -> Result<usize, RefreshError> {
        let rows = self.store.top_standings(self.snapshot_size).await?;

        let mut entries = Vec::with_capacity(rows.len());
        let mut index_healthy = true;
        for row in rows {
            let player_id = row.id()?;
            if index_healthy
                && let Err(e) = self.index.upsert(player_id, row.total_score).await
            {
                tracing::warn!(error = %e, "Rank index unavailable during refresh");
                index_healthy = false;
            }
            entries.push((player_id, row.username, row.total_score));
        }

        let snapshot = TopSnapshot::from_sorted(entries);
        self.cache.set_top_n(&snapshot).await?;
        Ok(snapshot.len())
    }

    /// Rebuild the local rank index from every durable aggregate.
    ///
    /// Upserts committed while the aggregates are being read are replayed on
    /// top of the rebuilt contents.
    pub async fn rebuild_index(&self) -> Result<u64, RefreshError> {
        let started = Instant::now();
        let pending = self.index.begin_rebuild();
        let totals = self.store.all_totals().await?;
        let count = pending.finish(totals).await?;

        let size = self.index.len().await.unwrap_or(count);
        metrics::RANK_INDEX_SIZE.set(i64::try_from(size).unwrap_or(i64::MAX));
        tracing::info!(
            entries = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rank index rebuilt from durable aggregates"
        );
        Ok(count)
    }

    /// Full reconciliation: rebuild the local index, then rewrite the advisory
    /// rank column if no other instance is already doing so.
    pub async fn reconcile(&self) -> Result<u64, RefreshError> {
        let count = self.rebuild_index().await?;

        let store = &self.store;
        let advisory = with_lease(
            self.leases.as_ref(),
            RECONCILE_LEASE,
            self.reconcile_lease_ttl,
            move || async move { store.recompute_advisory_ranks().await },
        )
        .await;

        match advisory {
            Ok(Some(Ok(updated))) => {
                tracing::debug!(updated = updated, "Advisory ranks recomputed");
            }
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "Advisory rank recompute failed");
            }
            Ok(None) => {
                tracing::debug!("Advisory rank recompute running elsewhere; skipping");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reconcile lease backend unavailable");
            }
        }

        Ok(count)
    }

    fn set_state(&self, next: RefreshState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Refresh state Mutex was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }
}
