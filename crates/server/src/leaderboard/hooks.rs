//! Post-commit hooks run by the aggregator.
//!
//! Hooks keep the derived projections in step with the durable store. They
//! run only after the score transaction has committed, in registration order,
//! and their failures never fail the submission.

use async_trait::async_trait;
use podium_ranking::{RankIndex, RankingResult, ResultCache};
use podium_store::ScoreReceipt;

/// Work to run after a score submission has committed.
#[async_trait]
pub trait PostCommitHook: Send + Sync {
    /// Short stable name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn after_commit(&self, receipt: &ScoreReceipt) -> RankingResult<()>;
}

/// Mirrors the committed total into the rank index.
pub struct RankIndexHook {
    index: RankIndex,
}

impl RankIndexHook {
    pub fn new(index: RankIndex) -> Self {
        Self { index }
    }
}

#[async_trait]
impl PostCommitHook for RankIndexHook {
    fn name(&self) -> &'static str {
        "rank_index"
    }

    async fn after_commit(&self, receipt: &ScoreReceipt) -> RankingResult<()> {
        self.index.upsert(receipt.player_id, receipt.new_total).await
    }
}

/// Drops the submitting player's cached rank.
///
/// Registered after [`RankIndexHook`] so the next rank read recomputes from
/// an index that already holds the new total.
pub struct RankCacheInvalidationHook {
    cache: ResultCache,
}

impl RankCacheInvalidationHook {
    pub fn new(cache: ResultCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl PostCommitHook for RankCacheInvalidationHook {
    fn name(&self) -> &'static str {
        "rank_cache_invalidation"
    }

    async fn after_commit(&self, receipt: &ScoreReceipt) -> RankingResult<()> {
        self.cache.invalidate_rank(receipt.player_id).await
    }
}
