//! The leaderboard engine exposed to the request layer.
//!
//! - [`Aggregator`]: durable score submission plus post-commit hooks
//! - [`StandingsReader`]: cached top-N and per-player rank reads
//! - [`RefreshCoordinator`]: leased top-N refresh and index reconciliation

pub mod aggregator;
pub mod error;
pub mod hooks;
pub mod reads;
pub mod refresh;

pub use aggregator::Aggregator;
pub use error::{LeaderboardError, LeaderboardResult};
pub use hooks::{PostCommitHook, RankCacheInvalidationHook, RankIndexHook};
pub use reads::StandingsReader;
pub use refresh::{RefreshCoordinator, RefreshError, RefreshState, TickOutcome};

use podium_core::config::AppConfig;
use podium_core::{PlayerStanding, TopSnapshot};
use podium_ranking::{RankIndex, ResultCache};
use podium_store::{DurableStore, ScoreReceipt};
use std::sync::Arc;

/// Upward interface: submit a score, read the top-N, read one player's rank.
pub struct Leaderboard {
    aggregator: Aggregator,
    reader: StandingsReader,
    max_top_n: u32,
}

impl Leaderboard {
    /// Wire the aggregator with the standard hooks: index upsert first, then
    /// rank cache invalidation.
    pub fn new(
        store: Arc<dyn DurableStore>,
        index: RankIndex,
        cache: ResultCache,
        config: &AppConfig,
    ) -> Self {
        let aggregator = Aggregator::new(store.clone(), &config.scoring)
            .with_hook(Arc::new(RankIndexHook::new(index.clone())))
            .with_hook(Arc::new(RankCacheInvalidationHook::new(cache.clone())));
        let reader = StandingsReader::new(store, index, cache, config.cache.snapshot_size);

        Self {
            aggregator,
            reader,
            max_top_n: config.server.max_top_n,
        }
    }

    pub async fn submit_score(
        &self,
        player_id: i64,
        delta: i64,
        mode: Option<&str>,
    ) -> LeaderboardResult<ScoreReceipt> {
        self.aggregator.submit(player_id, delta, mode).await
    }

    /// The first `n` players, 1 <= n <= `server.max_top_n`.
    pub async fn get_top_n(&self, n: u32) -> LeaderboardResult<TopSnapshot> {
        if n == 0 || n > self.max_top_n {
            return Err(podium_core::Error::InvalidLimit {
                limit: n,
                max: self.max_top_n,
            }
            .into());
        }
        self.reader.top_n(n).await
    }

    pub async fn get_player_rank(&self, player_id: i64) -> LeaderboardResult<PlayerStanding> {
        self.reader.player_rank(player_id).await
    }
}
