//! Layered read paths: result cache, then rank index, then durable store.

use super::error::{LeaderboardError, LeaderboardResult};
use crate::metrics;
use podium_core::{CachedRank, PlayerId, PlayerStanding, TopSnapshot};
use podium_ranking::{RankIndex, ResultCache};
use podium_store::DurableStore;
use podium_store::repos::{PlayerRepo, StandingsRepo};
use std::collections::HashMap;
use std::sync::Arc;

/// Serves top-N and per-player rank reads.
///
/// Cache and index failures degrade to the next layer down; only durable
/// store failures reach the caller.
pub struct StandingsReader {
    store: Arc<dyn DurableStore>,
    index: RankIndex,
    cache: ResultCache,
    snapshot_size: u32,
}

impl StandingsReader {
    pub fn new(
        store: Arc<dyn DurableStore>,
        index: RankIndex,
        cache: ResultCache,
        snapshot_size: u32,
    ) -> Self {
        Self {
            store,
            index,
            cache,
            snapshot_size,
        }
    }

    /// The first `n` players. `n` must already be validated.
    ///
    /// Requests up to the snapshot size are answered from one shared cached
    /// snapshot; a miss recomputes and repopulates it before returning. Larger
    /// requests bypass the cache.
    pub async fn top_n(&self, n: u32) -> LeaderboardResult<TopSnapshot> {
        if n > self.snapshot_size {
            return self.compute_top(n).await;
        }

        match self.cache.get_top_n().await {
            Ok(Some(snapshot)) => {
                metrics::record_cache_lookup("top_n", true);
                return Ok(snapshot.truncated(n as usize));
            }
            Ok(None) => metrics::record_cache_lookup("top_n", false),
            Err(e) => {
                metrics::record_cache_lookup("top_n", false);
                tracing::warn!(error = %e, "Top-N cache read failed; recomputing");
            }
        }

        let snapshot = self.compute_top(self.snapshot_size).await?;
        if let Err(e) = self.cache.set_top_n(&snapshot).await {
            tracing::warn!(error = %e, "Failed to populate top-N cache");
        }
        Ok(snapshot.truncated(n as usize))
    }

    /// Rank of one player: cached entry, else warm live index, else durable count.
    pub async fn player_rank(&self, player_id: i64) -> LeaderboardResult<PlayerStanding> {
        let player_id = PlayerId::new(player_id)?;

        match self.cache.get_rank(player_id).await {
            Ok(Some(cached)) => {
                metrics::record_cache_lookup("rank", true);
                return Ok(PlayerStanding::ranked(player_id, cached));
            }
            Ok(None) => metrics::record_cache_lookup("rank", false),
            Err(e) => {
                metrics::record_cache_lookup("rank", false);
                tracing::warn!(player_id = %player_id, error = %e, "Rank cache read failed");
            }
        }

        // A cold index only holds players touched since startup, so its
        // positions are relative to that subset.
        let indexed = if self.index.is_warm() {
            match self.index.rank_of(player_id).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(player_id = %player_id, error = %e, "Rank index lookup failed");
                    None
                }
            }
        } else {
            None
        };

        let entry = match indexed {
            Some(entry) => entry,
            None => match self.durable_rank(player_id).await? {
                Some(entry) => entry,
                None => return self.unscored_or_missing(player_id).await,
            },
        };

        if let Err(e) = self.cache.set_rank(player_id, entry).await {
            tracing::warn!(player_id = %player_id, error = %e, "Failed to populate rank cache");
        }
        Ok(PlayerStanding::ranked(player_id, entry))
    }

    /// Top `n` from the index when it is warm, else from the durable store.
    pub(crate) async fn compute_top(&self, n: u32) -> LeaderboardResult<TopSnapshot> {
        if self.index.is_warm() {
            match self.index.top(n as usize).await {
                Ok(ranked) => {
                    if let Some(snapshot) = self.attach_names(ranked).await? {
                        return Ok(snapshot);
                    }
                    tracing::warn!("Rank index holds unknown players; reading top-N from store");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Rank index top-N failed; reading from store");
                }
            }
        }
        self.top_from_store(n).await
    }

    /// Join display names onto index rows. `None` if any player is unknown.
    async fn attach_names(
        &self,
        ranked: Vec<(PlayerId, i64)>,
    ) -> LeaderboardResult<Option<TopSnapshot>> {
        let ids: Vec<PlayerId> = ranked.iter().map(|(id, _)| *id).collect();
        let mut names = HashMap::with_capacity(ids.len());
        for player in self.store.get_players(&ids).await? {
            names.insert(player.id()?, player.username);
        }

        let rows: Option<Vec<_>> = ranked
            .into_iter()
            .map(|(id, total)| names.remove(&id).map(|name| (id, name, total)))
            .collect();
        Ok(rows.map(TopSnapshot::from_sorted))
    }

    async fn top_from_store(&self, n: u32) -> LeaderboardResult<TopSnapshot> {
        let rows = self.store.top_standings(n).await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push((row.id()?, row.username, row.total_score));
        }
        Ok(TopSnapshot::from_sorted(entries))
    }

    /// Rank derived from the durable aggregate, repairing the index on the way.
    async fn durable_rank(&self, player_id: PlayerId) -> LeaderboardResult<Option<CachedRank>> {
        metrics::DURABLE_RANK_FALLBACKS.inc();

        let Some(aggregate) = self.store.get_aggregate(player_id).await? else {
            return Ok(None);
        };
        let ahead = self
            .store
            .count_ranked_ahead(aggregate.total_score, player_id)
            .await?;

        if let Err(e) = self.index.upsert(player_id, aggregate.total_score).await {
            tracing::debug!(player_id = %player_id, error = %e, "Rank index read-repair failed");
        }

        Ok(Some(CachedRank {
            rank: ahead + 1,
            total_score: aggregate.total_score,
        }))
    }

    async fn unscored_or_missing(&self, player_id: PlayerId) -> LeaderboardResult<PlayerStanding> {
        match self.store.get_player(player_id).await? {
            Some(_) => Ok(PlayerStanding::unscored(player_id)),
            None => Err(LeaderboardError::NotFound(format!(
                "player {player_id} not found"
            ))),
        }
    }
}
