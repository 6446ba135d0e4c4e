//! Application state shared across handlers.

use crate::leaderboard::{Leaderboard, RefreshCoordinator};
use crate::lease::StoreLeaseProvider;
use podium_core::config::{AppConfig, LeaseBackendConfig};
use podium_ranking::{
    BackendLeaseProvider, CacheBackend, CacheTtls, LeaseProvider, MemoryBackend, RankBackend,
    RankIndex, ResultCache,
};
use podium_store::DurableStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Durable store (source of truth).
    pub store: Arc<dyn DurableStore>,
    /// Submission and read entry points.
    pub leaderboard: Arc<Leaderboard>,
    /// Live rank index.
    pub index: RankIndex,
    /// Cached read results.
    pub cache: ResultCache,
    /// Backend under `cache`, kept for the expiry sweeper.
    pub cache_backend: Arc<dyn CacheBackend>,
    /// Top-N refresh and reconciliation.
    pub refresh: Arc<RefreshCoordinator>,
}

impl AppState {
    /// Create state backed by one in-process [`MemoryBackend`] for both the
    /// rank index and the result cache.
    pub fn new(config: AppConfig, store: Arc<dyn DurableStore>) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        Self::with_backends(config, store, backend.clone(), backend)
    }

    /// Create state over explicit projection backends.
    pub fn with_backends(
        config: AppConfig,
        store: Arc<dyn DurableStore>,
        rank_backend: Arc<dyn RankBackend>,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let index = RankIndex::new(rank_backend);
        let cache = ResultCache::new(
            cache_backend.clone(),
            CacheTtls {
                top_n: config.cache.top_n_ttl(),
                rank: config.cache.rank_ttl(),
            },
        );

        let leases: Arc<dyn LeaseProvider> = match config.refresh.lease_backend {
            LeaseBackendConfig::Store => Arc::new(StoreLeaseProvider::new(store.clone())),
            LeaseBackendConfig::Memory => {
                tracing::info!("Using in-process leases; refreshes are not coordinated across instances");
                Arc::new(BackendLeaseProvider::new(cache_backend.clone()))
            }
        };

        let leaderboard = Leaderboard::new(store.clone(), index.clone(), cache.clone(), &config);
        let refresh = RefreshCoordinator::new(
            store.clone(),
            index.clone(),
            cache.clone(),
            leases,
            &config,
        );

        Self {
            config: Arc::new(config),
            store,
            leaderboard: Arc::new(leaderboard),
            index,
            cache,
            cache_backend,
            refresh: Arc::new(refresh),
        }
    }
}
