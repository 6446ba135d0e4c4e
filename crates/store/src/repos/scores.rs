//! Score event repository.

use crate::error::StoreResult;
use crate::models::{NewScoreEvent, ScoreEventRow, ScoreReceipt};
use async_trait::async_trait;
use podium_core::PlayerId;

/// Repository for score submissions.
#[async_trait]
pub trait ScoreRepo: Send + Sync {
    /// Record a score event and increment the player's aggregate in one
    /// transaction.
    ///
    /// The increment is a single `total_score = total_score + delta` upsert
    /// evaluated under the row lock, never a read followed by a write, so
    /// concurrent submissions for one player serialize without lost updates.
    /// Either the event and the new total both commit or neither does.
    ///
    /// Returns `NotFound` if the player does not exist.
    async fn record_score(&self, event: &NewScoreEvent) -> StoreResult<ScoreReceipt>;

    /// List a player's most recent score events, newest first.
    async fn list_score_events(
        &self,
        player_id: PlayerId,
        limit: u32,
    ) -> StoreResult<Vec<ScoreEventRow>>;
}
