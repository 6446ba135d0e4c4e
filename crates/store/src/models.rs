//! Database models mapping to the durable schema.

use crate::error::{StoreError, StoreResult};
use podium_core::{GameMode, PlayerId, ScoreDelta};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Convert a stored id back into a `PlayerId`.
pub(crate) fn stored_player_id(raw: i64) -> StoreResult<PlayerId> {
    PlayerId::new(raw).map_err(|e| StoreError::Internal(format!("corrupt player id: {e}")))
}

// =============================================================================
// Players
// =============================================================================

/// Player record. Created once and never updated.
#[derive(Debug, Clone, FromRow)]
pub struct PlayerRow {
    pub player_id: i64,
    pub username: String,
    pub created_at: OffsetDateTime,
}

impl PlayerRow {
    pub fn id(&self) -> StoreResult<PlayerId> {
        stored_player_id(self.player_id)
    }
}

// =============================================================================
// Score events (append-only)
// =============================================================================

/// Immutable score event.
#[derive(Debug, Clone, FromRow)]
pub struct ScoreEventRow {
    pub event_id: i64,
    pub player_id: i64,
    pub delta: i64,
    pub game_mode: String,
    pub created_at: OffsetDateTime,
}

/// A score event to be recorded.
#[derive(Debug, Clone)]
pub struct NewScoreEvent {
    pub player_id: PlayerId,
    pub delta: ScoreDelta,
    pub mode: GameMode,
    pub occurred_at: OffsetDateTime,
}

impl NewScoreEvent {
    pub fn now(player_id: PlayerId, delta: ScoreDelta, mode: GameMode) -> Self {
        Self {
            player_id,
            delta,
            mode,
            occurred_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Outcome of a committed score submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReceipt {
    pub event_id: i64,
    pub player_id: PlayerId,
    pub delta: i64,
    /// Aggregate total after the increment, as committed.
    pub new_total: i64,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Per-player running total.
#[derive(Debug, Clone, FromRow)]
pub struct AggregateRow {
    pub player_id: i64,
    pub total_score: i64,
    /// Batch-computed position; stale between recompute passes.
    pub advisory_rank: Option<i64>,
    pub updated_at: OffsetDateTime,
}

/// Aggregate joined with the player's display name, as returned by the
/// ordered top scan.
#[derive(Debug, Clone, FromRow)]
pub struct StandingRow {
    pub player_id: i64,
    pub username: String,
    pub total_score: i64,
}

impl StandingRow {
    pub fn id(&self) -> StoreResult<PlayerId> {
        stored_player_id(self.player_id)
    }
}

// =============================================================================
// Leases
// =============================================================================

/// Expiring mutual-exclusion token.
#[derive(Debug, Clone, FromRow)]
pub struct LeaseRow {
    pub name: String,
    pub holder: String,
    /// Expiry as unix milliseconds; integer so comparisons behave the same
    /// in SQLite and PostgreSQL.
    pub expires_at_ms: i64,
}
