//! Standings repository: ordered reads over aggregates.

use crate::error::StoreResult;
use crate::models::{AggregateRow, StandingRow};
use async_trait::async_trait;
use podium_core::PlayerId;

/// Repository for ranked reads over the aggregate table.
///
/// Ordering everywhere is `total_score DESC, player_id ASC`.
#[async_trait]
pub trait StandingsRepo: Send + Sync {
    /// Point lookup of a player's aggregate.
    async fn get_aggregate(&self, player_id: PlayerId) -> StoreResult<Option<AggregateRow>>;

    /// Highest totals first, limited to `limit` rows. Served by the
    /// `(total_score DESC, player_id)` index rather than a full sort.
    async fn top_standings(&self, limit: u32) -> StoreResult<Vec<StandingRow>>;

    /// Number of aggregates ordered ahead of (`total_score`, `player_id`):
    /// strictly greater totals, plus equal totals with a smaller player id.
    /// A player's 1-based rank is this count plus one.
    async fn count_ranked_ahead(&self, total_score: i64, player_id: PlayerId) -> StoreResult<u64>;

    /// Every (player, total) pair; the input of a rank index rebuild.
    async fn all_totals(&self) -> StoreResult<Vec<(PlayerId, i64)>>;

    /// Rewrite the denormalized `advisory_rank` column from current totals.
    /// Returns the number of rows whose rank changed.
    async fn recompute_advisory_ranks(&self) -> StoreResult<u64>;
}
