//! Live rank index mirrored from durable aggregates.

use crate::error::RankingResult;
use crate::traits::RankBackend;
use podium_core::{CachedRank, PlayerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Upserts seen while one or more rebuilds are in flight.
#[derive(Default)]
struct Journal {
    active: usize,
    writes: Vec<(PlayerId, i64)>,
}

/// Player totals kept in rank order on a [`RankBackend`].
///
/// The index is a projection: it may briefly disagree with the durable store
/// after a failed upsert and is healed by a rebuild. Until the first rebuild
/// completes it is "cold" and readers should not trust a miss.
///
/// Totals only grow, so upserts never move a player down. A rebuild replaces
/// the contents wholesale; upserts that land while it is in flight are
/// journaled and replayed on top of the rebuilt contents.
#[derive(Clone)]
pub struct RankIndex {
    backend: Arc<dyn RankBackend>,
    warm: Arc<AtomicBool>,
    journal: Arc<Mutex<Journal>>,
}

impl RankIndex {
    pub fn new(backend: Arc<dyn RankBackend>) -> Self {
        Self {
            backend,
            warm: Arc::new(AtomicBool::new(false)),
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    /// Whether a full rebuild has completed, so absence means "no score".
    pub fn is_warm(&self) -> bool {
        self.warm.load(Ordering::Acquire)
    }

    /// Record a player's committed total. A total lower than the indexed one
    /// is a late arrival and is ignored.
    pub async fn upsert(&self, player_id: PlayerId, total_score: i64) -> RankingResult<()> {
        {
            let mut journal = self.lock_journal();
            if journal.active > 0 {
                journal.writes.push((player_id, total_score));
            }
        }
        self.backend.raise_score(player_id, total_score).await?;
        Ok(())
    }

    /// 1-based rank and total of a player, if indexed.
    pub async fn rank_of(&self, player_id: PlayerId) -> RankingResult<Option<CachedRank>> {
        let standing = self.backend.standing_of(player_id).await?;
        Ok(standing.map(|(position, total_score)| CachedRank {
            rank: position + 1,
            total_score,
        }))
    }

    /// At most `k` players from the top, highest total first.
    pub async fn top(&self, k: usize) -> RankingResult<Vec<(PlayerId, i64)>> {
        self.backend.top(k).await
    }

    /// Start journaling upserts ahead of reading a durable snapshot.
    ///
    /// Call this before reading the snapshot so that every upsert committed
    /// after the read is replayed by [`PendingRebuild::finish`].
    pub fn begin_rebuild(&self) -> PendingRebuild {
        self.lock_journal().active += 1;
        PendingRebuild {
            index: self.clone(),
        }
    }

    /// Replace the index contents wholesale and mark it warm.
    ///
    /// Idempotent. Equivalent to `begin_rebuild().finish(entries)` for a
    /// snapshot that is already in hand.
    pub async fn rebuild_from(
        &self,
        entries: impl IntoIterator<Item = (PlayerId, i64)>,
    ) -> RankingResult<u64> {
        self.begin_rebuild().finish(entries).await
    }

    /// Number of indexed players.
    pub async fn len(&self) -> RankingResult<u64> {
        self.backend.len().await
    }

    fn lock_journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Rank index journal Mutex was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }
}

/// A rebuild whose snapshot is being read. Dropping it without calling
/// [`finish`](Self::finish) abandons the rebuild.
pub struct PendingRebuild {
    index: RankIndex,
}

impl PendingRebuild {
    /// Swap in `entries`, replay journaled upserts, and mark the index warm.
    pub async fn finish(
        self,
        entries: impl IntoIterator<Item = (PlayerId, i64)>,
    ) -> RankingResult<u64> {
        let entries: Vec<_> = entries.into_iter().collect();
        let count = entries.len() as u64;
        let backend = &self.index.backend;
        backend.replace_all(entries).await?;

        // Writes journaled after this drain are applied by their own upsert
        // call, which runs after the journal push.
        let replay = self.index.lock_journal().writes.clone();
        for (player_id, total_score) in &replay {
            backend.raise_score(*player_id, *total_score).await?;
        }

        self.index.warm.store(true, Ordering::Release);
        tracing::debug!(
            entries = count,
            replayed = replay.len(),
            "Rank index rebuilt"
        );
        Ok(count)
    }
}

impl Drop for PendingRebuild {
    fn drop(&mut self) {
        let mut journal = self.index.lock_journal();
        journal.active = journal.active.saturating_sub(1);
        if journal.active == 0 {
            journal.writes.clear();
        }
    }
}
