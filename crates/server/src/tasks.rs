//! Background loops spawned by the binary.

use crate::leaderboard::RefreshCoordinator;
use podium_ranking::CacheBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Run a refresh tick every `interval`.
pub fn spawn_refresh_loop(coordinator: Arc<RefreshCoordinator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            coordinator.tick().await;
        }
    })
}

/// Reconcile the rank index every `interval`. The first pass runs one full
/// interval after spawning; startup warm-up covers time zero.
pub fn spawn_reconcile_loop(
    coordinator: Arc<RefreshCoordinator>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = coordinator.reconcile().await {
                tracing::error!(error = %e, "Rank index reconciliation failed");
            }
        }
    })
}

/// Retry the index rebuild every `interval` until one succeeds. Used when
/// startup warm-up failed; until then rank reads go to the durable store.
pub fn spawn_warm_up_retry(coordinator: Arc<RefreshCoordinator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut attempts = 1u32;
        loop {
            ticker.tick().await;
            attempts += 1;
            match coordinator.rebuild_index().await {
                Ok(indexed) => {
                    tracing::info!(players = indexed, attempts = attempts, "Rank index warmed");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempts = attempts, "Rank index warm-up retry failed");
                }
            }
        }
    })
}

/// Purge expired cache keys every `interval`.
pub fn spawn_cache_sweeper(backend: Arc<dyn CacheBackend>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match backend.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::debug!(purged = purged, "Cache sweeper purged expired keys");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cache sweep failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use podium_ranking::MemoryBackend;

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_expired_keys() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("short", Bytes::from_static(b"x"), Duration::ZERO)
            .await
            .unwrap();
        backend
            .set("long", Bytes::from_static(b"y"), Duration::from_secs(3600))
            .await
            .unwrap();

        let handle = spawn_cache_sweeper(backend.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        assert_eq!(backend.purge_expired().await.unwrap(), 0);
        assert!(backend.get("long").await.unwrap().is_some());
    }
}
