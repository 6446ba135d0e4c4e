//! Score submission.

use super::error::{LeaderboardError, LeaderboardResult};
use super::hooks::PostCommitHook;
use crate::metrics;
use podium_core::config::ScoringConfig;
use podium_core::{GameMode, PlayerId, ScoreDelta};
use podium_store::repos::ScoreRepo;
use podium_store::{DurableStore, NewScoreEvent, ScoreReceipt};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Applies score submissions to the durable store, then runs post-commit hooks.
///
/// The event insert and the aggregate increment share one transaction bounded
/// by `submit_timeout`. Dropping the transaction on timeout rolls it back, so
/// a timed-out submission leaves no partial state. A timeout that fires while
/// the commit itself is in flight cannot tell whether the commit landed; the
/// caller sees `Timeout` either way and may retry.
pub struct Aggregator {
    store: Arc<dyn DurableStore>,
    hooks: Vec<Arc<dyn PostCommitHook>>,
    max_delta: i64,
    submit_timeout: Duration,
}

impl Aggregator {
    pub fn new(store: Arc<dyn DurableStore>, scoring: &ScoringConfig) -> Self {
        Self {
            store,
            hooks: Vec::new(),
            max_delta: scoring.max_delta,
            submit_timeout: scoring.submit_timeout(),
        }
    }

    /// Append a hook. Hooks run in the order they were added.
    pub fn with_hook(mut self, hook: Arc<dyn PostCommitHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Record a score event for `player_id` and return the committed total.
    pub async fn submit(
        &self,
        player_id: i64,
        delta: i64,
        mode: Option<&str>,
    ) -> LeaderboardResult<ScoreReceipt> {
        let started = Instant::now();
        let result = self.submit_inner(player_id, delta, mode).await;
        metrics::record_submission(outcome_label(&result), started.elapsed());
        result
    }

    async fn submit_inner(
        &self,
        player_id: i64,
        delta: i64,
        mode: Option<&str>,
    ) -> LeaderboardResult<ScoreReceipt> {
        let player_id = PlayerId::new(player_id)?;
        let delta = ScoreDelta::new(delta, self.max_delta)?;
        let mode = mode.map(GameMode::parse).transpose()?.unwrap_or_default();
        let event = NewScoreEvent::now(player_id, delta, mode);

        let receipt =
            match tokio::time::timeout(self.submit_timeout, self.store.record_score(&event)).await
            {
                Ok(Ok(receipt)) => receipt,
                Ok(Err(e)) => {
                    let err = LeaderboardError::from(e);
                    if err.is_retryable() {
                        tracing::error!(player_id = %player_id, error = %err, "Score submission failed");
                    }
                    return Err(err);
                }
                Err(_) => {
                    tracing::error!(
                        player_id = %player_id,
                        timeout_ms = self.submit_timeout.as_millis() as u64,
                        "Score submission timed out; commit outcome unknown"
                    );
                    return Err(LeaderboardError::Timeout(self.submit_timeout));
                }
            };

        tracing::debug!(
            player_id = %player_id,
            event_id = receipt.event_id,
            delta = receipt.delta,
            new_total = receipt.new_total,
            mode = %mode,
            "Score recorded"
        );

        self.run_hooks(&receipt).await;
        Ok(receipt)
    }

    async fn run_hooks(&self, receipt: &ScoreReceipt) {
        for hook in &self.hooks {
            if let Err(e) = hook.after_commit(receipt).await {
                tracing::warn!(
                    hook = hook.name(),
                    player_id = %receipt.player_id,
                    new_total = receipt.new_total,
                    error = %e,
                    "Post-commit hook failed; projection will be reconciled"
                );
                metrics::record_hook_failure(hook.name());
            }
        }
    }
}

fn outcome_label(result: &LeaderboardResult<ScoreReceipt>) -> &'static str {
    match result {
        Ok(_) => "committed",
        Err(LeaderboardError::Validation(_)) => "invalid",
        Err(LeaderboardError::NotFound(_)) => "not_found",
        Err(LeaderboardError::Timeout(_)) => "timeout",
        Err(LeaderboardError::Conflict(_)) => "conflict",
        Err(LeaderboardError::Store(_)) => "store_error",
    }
}
