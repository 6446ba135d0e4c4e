//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Number of entries returned by the top-N endpoint when no limit is given.
    #[serde(default = "default_top_n")]
    pub default_top_n: u32,
    /// Largest limit a caller may request from the top-N endpoint.
    #[serde(default = "default_max_top_n")]
    pub max_top_n: u32,
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_top_n() -> u32 {
    10
}

fn default_max_top_n() -> u32 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_top_n == 0 {
            return Err("server.max_top_n must be at least 1".to_string());
        }
        if self.default_top_n == 0 || self.default_top_n > self.max_top_n {
            return Err(format!(
                "server.default_top_n {} must be between 1 and server.max_top_n ({})",
                self.default_top_n, self.max_top_n
            ));
        }
        Ok(())
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Durable store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// SQLite database (single instance deployments and tests).
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Seconds a statement waits on a locked database before failing.
        #[serde(default = "default_sqlite_busy_timeout_secs")]
        busy_timeout_secs: Option<u64>,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host.
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer PODIUM_STORE__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds. PostgreSQL cancels statements
        /// that run longer.
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    20
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(10_000)
}

fn default_sqlite_busy_timeout_secs() -> Option<u64> {
    Some(5)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/podium.db"),
            busy_timeout_secs: default_sqlite_busy_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Validate store configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StoreConfig::Sqlite { .. } => Ok(()),
            StoreConfig::Postgres {
                url,
                host,
                database,
                max_connections,
                ..
            } => {
                if *max_connections == 0 {
                    return Err("store.max_connections must be at least 1".to_string());
                }
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) => Ok(()),
                    (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(
                        "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                    ),
                    (None, Some(_), None) => Err(
                        "postgres config requires 'database' when using individual fields"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// Score submission limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Largest delta accepted for a single score event.
    #[serde(default = "default_max_delta")]
    pub max_delta: i64,
    /// Upper bound on the durable submission transaction, in milliseconds.
    /// On expiry the transaction is rolled back and the caller sees a
    /// retryable timeout.
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
}

fn default_max_delta() -> i64 {
    crate::DEFAULT_MAX_SCORE_DELTA
}

fn default_submit_timeout_ms() -> u64 {
    5_000
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_delta: default_max_delta(),
            submit_timeout_ms: default_submit_timeout_ms(),
        }
    }
}

impl ScoringConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_delta <= 0 {
            return Err(format!(
                "scoring.max_delta must be positive, got {}",
                self.max_delta
            ));
        }
        if self.submit_timeout_ms == 0 {
            return Err("scoring.submit_timeout_ms cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Result cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of the cached top-N snapshot, in seconds.
    #[serde(default = "default_top_n_ttl_secs")]
    pub top_n_ttl_secs: u64,
    /// Lifetime of a cached per-player rank, in seconds. Entries are also
    /// invalidated on that player's own write.
    #[serde(default = "default_rank_ttl_secs")]
    pub rank_ttl_secs: u64,
    /// Number of rows held by the cached top-N snapshot.
    #[serde(default = "default_snapshot_size")]
    pub snapshot_size: u32,
    /// Interval between sweeps of expired in-process cache keys, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_top_n_ttl_secs() -> u64 {
    15
}

fn default_rank_ttl_secs() -> u64 {
    30
}

fn default_snapshot_size() -> u32 {
    100
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            top_n_ttl_secs: default_top_n_ttl_secs(),
            rank_ttl_secs: default_rank_ttl_secs(),
            snapshot_size: default_snapshot_size(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CacheConfig {
    pub fn top_n_ttl(&self) -> Duration {
        Duration::from_secs(self.top_n_ttl_secs)
    }

    pub fn rank_ttl(&self) -> Duration {
        Duration::from_secs(self.rank_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.top_n_ttl_secs == 0 || self.rank_ttl_secs == 0 {
            return Err("cache TTLs must be at least 1 second".to_string());
        }
        if self.snapshot_size == 0 {
            return Err("cache.snapshot_size must be at least 1".to_string());
        }
        // tokio::time::interval panics on a zero period
        if self.sweep_interval_secs == 0 {
            return Err("cache.sweep_interval_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Where the refresh lease lives.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LeaseBackendConfig {
    /// A row in the durable store; coordinates every instance sharing the database.
    #[default]
    Store,
    /// The in-process backend; only coordinates tasks within one instance.
    Memory,
}

/// Refresh coordinator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Run the periodic top-N refresh loop (default: true).
    #[serde(default = "default_refresh_enabled")]
    pub enabled: bool,
    /// Seconds between refresh ticks.
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,
    /// Lease lifetime in seconds. Must be longer than the tick interval so a
    /// live holder never loses the lease mid-refresh, and short enough that a
    /// crashed holder costs at most one missed tick.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,
    /// Lease backend.
    #[serde(default)]
    pub lease_backend: LeaseBackendConfig,
    /// Seconds between full rank index rebuilds from the durable store.
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
}

fn default_refresh_enabled() -> bool {
    true
}

fn default_refresh_interval_secs() -> u64 {
    10
}

fn default_lease_ttl_secs() -> u64 {
    12
}

fn default_reconcile_interval_secs() -> u64 {
    300
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: default_refresh_enabled(),
            interval_secs: default_refresh_interval_secs(),
            lease_ttl_secs: default_lease_ttl_secs(),
            lease_backend: LeaseBackendConfig::default(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    /// Validate refresh configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("refresh.interval_secs cannot be 0".to_string());
        }
        if self.reconcile_interval_secs == 0 {
            return Err("refresh.reconcile_interval_secs cannot be 0".to_string());
        }
        if self.lease_ttl_secs <= self.interval_secs {
            return Err(format!(
                "refresh.lease_ttl_secs ({}) must be longer than refresh.interval_secs ({})",
                self.lease_ttl_secs, self.interval_secs
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl AppConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.** Uses SQLite at the default path, the in-process
    /// lease backend, and disables the background refresh loop so tests drive
    /// ticks explicitly.
    pub fn for_testing() -> Self {
        Self {
            refresh: RefreshConfig {
                enabled: false,
                lease_backend: LeaseBackendConfig::Memory,
                ..RefreshConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate every section, returning the first error.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.store.validate()?;
        self.scoring.validate()?;
        self.cache.validate()?;
        self.refresh.validate()?;
        Ok(())
    }
}
