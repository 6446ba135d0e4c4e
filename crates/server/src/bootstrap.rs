//! Startup warm-up run before the listener accepts traffic.

use crate::leaderboard::{RefreshError, TickOutcome};
use crate::state::AppState;

/// Rebuild the rank index from the durable store, then prime the top-N cache.
///
/// An index rebuild failure is returned; the caller decides whether to start
/// degraded (rank reads then count from the durable store until a retried
/// rebuild succeeds). A failed or skipped priming tick is only logged.
pub async fn warm_up(state: &AppState) -> Result<u64, RefreshError> {
    let indexed = state.refresh.rebuild_index().await?;

    match state.refresh.tick().await {
        TickOutcome::Refreshed { entries } => {
            tracing::info!(entries = entries, "Top-N cache primed");
        }
        TickOutcome::Skipped => {
            tracing::info!("Top-N cache is being refreshed by another instance");
        }
        TickOutcome::Failed => {
            tracing::warn!("Failed to prime top-N cache; first reads will recompute");
        }
    }

    Ok(indexed)
}
