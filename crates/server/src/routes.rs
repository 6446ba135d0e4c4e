//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check for load balancers and probes
        .route("/health", get(handlers::health_check))
        // Leaderboard
        .route("/api/leaderboard/submit", post(handlers::submit_score))
        .route("/api/leaderboard/top", get(handlers::get_top))
        .route("/api/leaderboard/rank/{user_id}", get(handlers::get_rank))
        // Players
        .route("/api/players", post(handlers::create_player))
        .route("/api/players/{user_id}", get(handlers::get_player))
        .route(
            "/api/players/{user_id}/sessions",
            get(handlers::list_sessions),
        );

    let mut router = Router::new().merge(api_routes);

    // Must be network-restricted when enabled; see crate::metrics.
    if state.config.server.metrics_enabled {
        let metrics_routes = Router::new().route("/metrics", get(metrics_handler));
        router = router.merge(metrics_routes);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
