//! Short-TTL cache of serialized leaderboard reads.

use crate::error::RankingResult;
use crate::traits::CacheBackend;
use bytes::Bytes;
use podium_core::{CachedRank, PlayerId, TopSnapshot};
use std::sync::Arc;
use std::time::Duration;

const TOP_N_KEY: &str = "leaderboard:top";

fn rank_key(player_id: PlayerId) -> String {
    format!("leaderboard:rank:{player_id}")
}

/// Expiry windows for the two cached read results.
#[derive(Clone, Copy, Debug)]
pub struct CacheTtls {
    pub top_n: Duration,
    pub rank: Duration,
}

/// Result cache over a [`CacheBackend`].
///
/// The top-N snapshot and the per-player ranks live under separate keys with
/// independent TTLs. Only a player's own rank entry is ever invalidated
/// explicitly; everything else expires passively.
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    ttls: CacheTtls,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttls: CacheTtls) -> Self {
        Self { backend, ttls }
    }

    pub async fn get_top_n(&self) -> RankingResult<Option<TopSnapshot>> {
        self.get_json(TOP_N_KEY).await
    }

    pub async fn set_top_n(&self, snapshot: &TopSnapshot) -> RankingResult<()> {
        self.set_json(TOP_N_KEY, snapshot, self.ttls.top_n).await
    }

    pub async fn get_rank(&self, player_id: PlayerId) -> RankingResult<Option<CachedRank>> {
        self.get_json(&rank_key(player_id)).await
    }

    pub async fn set_rank(&self, player_id: PlayerId, entry: CachedRank) -> RankingResult<()> {
        self.set_json(&rank_key(player_id), &entry, self.ttls.rank)
            .await
    }

    /// Drop a player's cached rank so their next read sees their own write.
    pub async fn invalidate_rank(&self, player_id: PlayerId) -> RankingResult<()> {
        self.backend.delete(&rank_key(player_id)).await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> RankingResult<Option<T>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // An unreadable entry is a miss; drop it so the next read repopulates.
                tracing::warn!(key = key, error = %e, "Discarding undecodable cache entry");
                self.backend.delete(key).await?;
                Ok(None)
            }
        }
    }

    async fn set_json<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> RankingResult<()> {
        let encoded = serde_json::to_vec(value)?;
        self.backend.set(key, Bytes::from(encoded), ttl).await
    }
}
