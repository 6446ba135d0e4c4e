//! Durable store trait and the SQLite implementation.

use crate::error::{StoreError, StoreResult};
use crate::repos::{LeaseRepo, PlayerRepo, ScoreRepo, StandingsRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined durable store trait.
#[async_trait]
pub trait DurableStore:
    PlayerRepo + ScoreRepo + StandingsRepo + LeaseRepo + Send + Sync
{
    /// Run database migrations.
    async fn migrate(&self) -> StoreResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;
}

/// SQLite-based durable store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store. Pass `":memory:"` for a private in-memory
    /// database.
    ///
    /// `busy_timeout_secs` bounds how long a statement waits on a locked
    /// database before failing (default 5).
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: Option<u64>) -> StoreResult<Self> {
        let path = path.as_ref();
        let busy_timeout = Duration::from_secs(busy_timeout_secs.unwrap_or(5));

        let opts = if path == Path::new(":memory:") {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        }
        .foreign_keys(true)
        // Prevent transient "database is locked" errors under concurrent access.
        .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            // SQLite has a single writer; one connection serializes submissions
            // instead of surfacing "database is locked" under load.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            busy_timeout_ms = busy_timeout.as_millis() as u64,
            "SQLite store opened"
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use podium_core::PlayerId;
    use sqlx::QueryBuilder;
    use time::OffsetDateTime;

    #[async_trait]
    impl PlayerRepo for SqliteStore {
        async fn create_player(&self, username: &str) -> StoreResult<PlayerRow> {
            sqlx::query_as::<_, PlayerRow>(
                r#"
                INSERT INTO players (username, created_at) VALUES (?, ?)
                RETURNING player_id, username, created_at
                "#,
            )
            .bind(username)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_insert(e, format!("username '{username}'")))
        }

        async fn get_player(&self, player_id: PlayerId) -> StoreResult<Option<PlayerRow>> {
            let row = sqlx::query_as::<_, PlayerRow>(
                "SELECT player_id, username, created_at FROM players WHERE player_id = ?",
            )
            .bind(player_id.get())
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_players(&self, player_ids: &[PlayerId]) -> StoreResult<Vec<PlayerRow>> {
            if player_ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT player_id, username, created_at FROM players WHERE player_id IN (",
            );
            let mut separated = builder.separated(", ");
            for id in player_ids {
                separated.push_bind(id.get());
            }
            separated.push_unseparated(")");

            let rows = builder
                .build_query_as::<PlayerRow>()
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl ScoreRepo for SqliteStore {
        async fn record_score(&self, event: &NewScoreEvent) -> StoreResult<ScoreReceipt> {
            let mut tx = self.pool.begin().await?;

            let exists: Option<i64> =
                sqlx::query_scalar("SELECT player_id FROM players WHERE player_id = ?")
                    .bind(event.player_id.get())
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Err(StoreError::NotFound(format!(
                    "player {} not found",
                    event.player_id
                )));
            }

            let event_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO score_events (player_id, delta, game_mode, created_at)
                VALUES (?, ?, ?, ?)
                RETURNING event_id
                "#,
            )
            .bind(event.player_id.get())
            .bind(event.delta.get())
            .bind(event.mode.as_str())
            .bind(event.occurred_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_insert(e, "score event"))?;

            let new_total: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO aggregates (player_id, total_score, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(player_id) DO UPDATE SET
                    total_score = aggregates.total_score + excluded.total_score,
                    updated_at = excluded.updated_at
                RETURNING total_score
                "#,
            )
            .bind(event.player_id.get())
            .bind(event.delta.get())
            .bind(event.occurred_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StoreError::from_insert(e, "aggregate"))?;

            tx.commit().await?;

            Ok(ScoreReceipt {
                event_id,
                player_id: event.player_id,
                delta: event.delta.get(),
                new_total,
            })
        }

        async fn list_score_events(
            &self,
            player_id: PlayerId,
            limit: u32,
        ) -> StoreResult<Vec<ScoreEventRow>> {
            let rows = sqlx::query_as::<_, ScoreEventRow>(
                r#"
                SELECT event_id, player_id, delta, game_mode, created_at
                FROM score_events
                WHERE player_id = ?
                ORDER BY event_id DESC
                LIMIT ?
                "#,
            )
            .bind(player_id.get())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl StandingsRepo for SqliteStore {
        async fn get_aggregate(&self, player_id: PlayerId) -> StoreResult<Option<AggregateRow>> {
            let row = sqlx::query_as::<_, AggregateRow>(
                "SELECT player_id, total_score, advisory_rank, updated_at FROM aggregates WHERE player_id = ?",
            )
            .bind(player_id.get())
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn top_standings(&self, limit: u32) -> StoreResult<Vec<StandingRow>> {
            let rows = sqlx::query_as::<_, StandingRow>(
                r#"
                SELECT a.player_id, p.username, a.total_score
                FROM aggregates a
                JOIN players p ON p.player_id = a.player_id
                ORDER BY a.total_score DESC, a.player_id ASC
                LIMIT ?
                "#,
            )
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn count_ranked_ahead(
            &self,
            total_score: i64,
            player_id: PlayerId,
        ) -> StoreResult<u64> {
            let count: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM aggregates
                WHERE total_score > ? OR (total_score = ? AND player_id < ?)
                "#,
            )
            .bind(total_score)
            .bind(total_score)
            .bind(player_id.get())
            .fetch_one(&self.pool)
            .await?;
            Ok(count as u64)
        }

        async fn all_totals(&self) -> StoreResult<Vec<(PlayerId, i64)>> {
            let rows: Vec<(i64, i64)> =
                sqlx::query_as("SELECT player_id, total_score FROM aggregates")
                    .fetch_all(&self.pool)
                    .await?;
            rows.into_iter()
                .map(|(id, total)| Ok((stored_player_id(id)?, total)))
                .collect()
        }

        async fn recompute_advisory_ranks(&self) -> StoreResult<u64> {
            let result = sqlx::query(
                r#"
                UPDATE aggregates
                SET advisory_rank = ranked.new_rank
                FROM (
                    SELECT player_id,
                           ROW_NUMBER() OVER (ORDER BY total_score DESC, player_id ASC) AS new_rank
                    FROM aggregates
                ) AS ranked
                WHERE ranked.player_id = aggregates.player_id
                  AND (aggregates.advisory_rank IS NULL OR aggregates.advisory_rank <> ranked.new_rank)
                "#,
            )
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl LeaseRepo for SqliteStore {
        async fn try_acquire_lease(
            &self,
            name: &str,
            holder: &str,
            expires_at_ms: i64,
            now_ms: i64,
        ) -> StoreResult<bool> {
            let result = sqlx::query(
                r#"
                INSERT INTO leases (name, holder, expires_at_ms) VALUES (?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    holder = excluded.holder,
                    expires_at_ms = excluded.expires_at_ms
                WHERE leases.expires_at_ms <= ?
                "#,
            )
            .bind(name)
            .bind(holder)
            .bind(expires_at_ms)
            .bind(now_ms)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() == 1)
        }

        async fn release_lease(&self, name: &str, holder: &str) -> StoreResult<bool> {
            let result = sqlx::query("DELETE FROM leases WHERE name = ? AND holder = ?")
                .bind(name)
                .bind(holder)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() == 1)
        }

        async fn get_lease(&self, name: &str) -> StoreResult<Option<LeaseRow>> {
            let row = sqlx::query_as::<_, LeaseRow>(
                "SELECT name, holder, expires_at_ms FROM leases WHERE name = ?",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    player_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS score_events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players(player_id),
    delta INTEGER NOT NULL CHECK (delta >= 0),
    game_mode TEXT NOT NULL CHECK (game_mode IN ('solo', 'team')),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_score_events_player ON score_events (player_id, event_id DESC);

CREATE TABLE IF NOT EXISTS aggregates (
    player_id INTEGER PRIMARY KEY REFERENCES players(player_id),
    total_score INTEGER NOT NULL DEFAULT 0 CHECK (total_score >= 0),
    advisory_rank INTEGER,
    updated_at TEXT NOT NULL
);

-- Serves the bounded top scan and the ranked-ahead count.
CREATE INDEX IF NOT EXISTS idx_aggregates_total ON aggregates (total_score DESC, player_id ASC);

CREATE TABLE IF NOT EXISTS leases (
    name TEXT PRIMARY KEY,
    holder TEXT NOT NULL,
    expires_at_ms INTEGER NOT NULL
);
"#;
