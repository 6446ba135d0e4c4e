//! Prometheus metrics for the podium server.
//!
//! Covers the write path (submissions, post-commit hooks), the read path
//! (cache hit ratios, durable fallbacks), and the refresh coordinator.
//!
//! The `/metrics` endpoint is unauthenticated so Prometheus can scrape it.
//! Metrics carry no player identifiers, but they do reveal traffic volume;
//! restrict the endpoint at the network layer in production.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};
use std::time::Duration;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Write path
pub static SUBMISSIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podium_score_submissions_total",
            "Score submissions by outcome",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static SUBMIT_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podium_score_submit_duration_seconds",
            "Time from validation to post-commit hooks finishing, by outcome",
        )
        .buckets(vec![
            0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
        ]),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static HOOK_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podium_post_commit_hook_failures_total",
            "Post-commit hook failures by hook",
        ),
        &["hook"],
    )
    .expect("metric creation failed")
});

// Read path
pub static CACHE_LOOKUPS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podium_cache_lookups_total",
            "Result cache lookups by cache and result",
        ),
        &["cache", "result"],
    )
    .expect("metric creation failed")
});

pub static DURABLE_RANK_FALLBACKS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "podium_durable_rank_fallbacks_total",
        "Rank reads answered from the durable store after a rank index miss",
    )
    .expect("metric creation failed")
});

// Refresh coordinator
pub static REFRESH_TICKS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("podium_refresh_ticks_total", "Refresh ticks by outcome"),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static REFRESH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podium_refresh_duration_seconds",
            "Refresh tick duration by outcome",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static RANK_INDEX_SIZE: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "podium_rank_index_entries",
        "Players in the local rank index after the last rebuild",
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so integration tests can build as many routers as they like.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(SUBMISSIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SUBMIT_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(HOOK_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CACHE_LOOKUPS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DURABLE_RANK_FALLBACKS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(REFRESH_TICKS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(REFRESH_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RANK_INDEX_SIZE.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

pub fn record_submission(outcome: &str, elapsed: Duration) {
    SUBMISSIONS.with_label_values(&[outcome]).inc();
    SUBMIT_DURATION
        .with_label_values(&[outcome])
        .observe(elapsed.as_secs_f64());
}

pub fn record_hook_failure(hook: &str) {
    HOOK_FAILURES.with_label_values(&[hook]).inc();
}

pub fn record_cache_lookup(cache: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    CACHE_LOOKUPS.with_label_values(&[cache, result]).inc();
}

pub fn record_refresh_tick(outcome: &str, elapsed: Duration) {
    REFRESH_TICKS.with_label_values(&[outcome]).inc();
    REFRESH_DURATION
        .with_label_values(&[outcome])
        .observe(elapsed.as_secs_f64());
}
