//! Durable store abstraction and implementations for podium.
//!
//! This crate is the source of truth for the leaderboard:
//! - Players (immutable identity and display name)
//! - Score events (append-only)
//! - Per-player aggregates, mutated only by atomic increment
//! - Expiring leases for single-writer coordination across instances

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::{NewScoreEvent, ScoreReceipt};
pub use postgres::PostgresStore;
pub use store::{DurableStore, SqliteStore};

use podium_core::config::StoreConfig;
use std::sync::Arc;

/// Create a durable store from configuration.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn DurableStore>> {
    config.validate().map_err(StoreError::Config)?;

    match config {
        StoreConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteStore::new(path, *busy_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn DurableStore>)
        }
        StoreConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(StoreError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn DurableStore>)
        }
    }
}
