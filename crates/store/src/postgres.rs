//! PostgreSQL-based durable store implementation.

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::repos::{LeaseRepo, PlayerRepo, ScoreRepo, StandingsRepo};
use crate::store::DurableStore;
use async_trait::async_trait;
use podium_core::PlayerId;
use podium_core::config::PgSslMode;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based durable store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// Lets the password arrive separately (e.g. via `PODIUM_STORE__PASSWORD`)
    /// instead of being embedded in a URL.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Alias for `from_url`.
    pub async fn new(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        Self::from_url(url, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        // A server-side timeout aborts the whole submission transaction, so a
        // hung increment never leaves a half-applied event behind.
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl DurableStore for PostgresStore {
    async fn migrate(&self) -> StoreResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PlayerRepo for PostgresStore {
    async fn create_player(&self, username: &str) -> StoreResult<PlayerRow> {
        sqlx::query_as::<_, PlayerRow>(
            r#"
            INSERT INTO players (username, created_at) VALUES ($1, $2)
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
            "SELECT player_id, username, created_at FROM players WHERE player_id = $1",
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
        let ids: Vec<i64> = player_ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query_as::<_, PlayerRow>(
            "SELECT player_id, username, created_at FROM players WHERE player_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ScoreRepo for PostgresStore {
    async fn record_score(&self, event: &NewScoreEvent) -> StoreResult<ScoreReceipt> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT player_id FROM players WHERE player_id = $1")
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
            VALUES ($1, $2, $3, $4)
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

        // The conflict branch takes the row lock and evaluates the increment
        // against the committed total, so concurrent submitters serialize here.
        let new_total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO aggregates (player_id, total_score, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (player_id) DO UPDATE SET
                total_score = aggregates.total_score + EXCLUDED.total_score,
                updated_at = EXCLUDED.updated_at
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
            WHERE player_id = $1
            ORDER BY event_id DESC
            LIMIT $2
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
impl StandingsRepo for PostgresStore {
    async fn get_aggregate(&self, player_id: PlayerId) -> StoreResult<Option<AggregateRow>> {
        let row = sqlx::query_as::<_, AggregateRow>(
            "SELECT player_id, total_score, advisory_rank, updated_at FROM aggregates WHERE player_id = $1",
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
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_ranked_ahead(&self, total_score: i64, player_id: PlayerId) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM aggregates
            WHERE total_score > $1 OR (total_score = $1 AND player_id < $2)
            "#,
        )
        .bind(total_score)
        .bind(player_id.get())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn all_totals(&self) -> StoreResult<Vec<(PlayerId, i64)>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as("SELECT player_id, total_score FROM aggregates")
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
              AND aggregates.advisory_rank IS DISTINCT FROM ranked.new_rank
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LeaseRepo for PostgresStore {
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        expires_at_ms: i64,
        now_ms: i64,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO leases (name, holder, expires_at_ms) VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET
                holder = EXCLUDED.holder,
                expires_at_ms = EXCLUDED.expires_at_ms
            WHERE leases.expires_at_ms <= $4
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
        let result = sqlx::query("DELETE FROM leases WHERE name = $1 AND holder = $2")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_lease(&self, name: &str) -> StoreResult<Option<LeaseRow>> {
        let row = sqlx::query_as::<_, LeaseRow>(
            "SELECT name, holder, expires_at_ms FROM leases WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
