//! Podium server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use podium_core::config::AppConfig;
use podium_server::bootstrap::warm_up;
use podium_server::{AppState, create_router, tasks};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Podium - a leaderboard ranking and caching service
#[derive(Parser, Debug)]
#[command(name = "podiumd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "PODIUM_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration from an optional TOML file overlaid with `PODIUM_`
/// environment variables (`PODIUM_CACHE__TOP_N_TTL_SECS=5`).
fn load_config(path: &str) -> Result<AppConfig> {
    let config_path = std::path::Path::new(path);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::info!(config_path = %path, "No config file found; using defaults and environment");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("PODIUM_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Podium v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    podium_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let store = podium_store::from_config(&config.store)
        .await
        .context("failed to initialize durable store")?;
    store
        .health_check()
        .await
        .context("durable store health check failed")?;
    tracing::info!("Durable store initialized");

    let state = AppState::new(config.clone(), store);

    // Rank reads bypass a cold index and count from the durable store, so a
    // failed warm-up is not fatal; it is retried until the index is built.
    match warm_up(&state).await {
        Ok(indexed) => tracing::info!(players = indexed, "Rank index warmed"),
        Err(e) => {
            tracing::error!(error = %e, "Rank index warm-up failed; serving reads from the store");
            tasks::spawn_warm_up_retry(state.refresh.clone(), config.refresh.interval());
        }
    }

    if config.refresh.enabled {
        tasks::spawn_refresh_loop(state.refresh.clone(), config.refresh.interval());
        tasks::spawn_reconcile_loop(state.refresh.clone(), config.refresh.reconcile_interval());
        tracing::info!(
            interval_secs = config.refresh.interval_secs,
            lease_ttl_secs = config.refresh.lease_ttl_secs,
            reconcile_interval_secs = config.refresh.reconcile_interval_secs,
            "Refresh coordinator spawned"
        );
    } else {
        tracing::info!("Refresh loop disabled; top-N cache fills on read");
    }

    tasks::spawn_cache_sweeper(state.cache_backend.clone(), config.cache.sweep_interval());

    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
