//! Server test utilities.

use podium_core::config::{AppConfig, StoreConfig};
use podium_ranking::{CacheBackend, RankBackend};
use podium_server::{AppState, create_router};
use podium_store::{DurableStore, SqliteStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server over a temporary SQLite database and the
    /// in-process projection backend.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let (temp_dir, config, store) = Self::prepare(modifier).await;
        let state = AppState::new(config, store);
        Self::finish(temp_dir, state)
    }

    /// Create a test server over explicit projection backends.
    pub async fn with_backends(
        rank_backend: Arc<dyn RankBackend>,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let (temp_dir, config, store) = Self::prepare(|_| {}).await;
        let state = AppState::with_backends(config, store, rank_backend, cache_backend);
        Self::finish(temp_dir, state)
    }

    async fn prepare<F>(modifier: F) -> (TempDir, AppConfig, Arc<dyn DurableStore>)
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("podium.db");
        let store: Arc<dyn DurableStore> = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create durable store"),
        );

        let mut config = AppConfig::for_testing();
        config.store = StoreConfig::Sqlite {
            path: db_path,
            busy_timeout_secs: None,
        };
        modifier(&mut config);

        (temp_dir, config, store)
    }

    fn finish(temp_dir: TempDir, state: AppState) -> Self {
        podium_server::metrics::register_metrics();
        let router = create_router(state.clone());
        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying durable store.
    pub fn store(&self) -> Arc<dyn DurableStore> {
        self.state.store.clone()
    }
}
