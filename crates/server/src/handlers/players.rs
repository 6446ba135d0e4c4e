//! Player endpoints.

use super::common::{parse_user_id, read_json};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use podium_core::{PlayerId, validate_username};
use podium_store::models::{PlayerRow, ScoreEventRow};
use podium_store::repos::{PlayerRepo, ScoreRepo};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const DEFAULT_SESSIONS_LIMIT: u32 = 20;
const MAX_SESSIONS_LIMIT: u32 = 100;

/// Create player request.
#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub username: String,
}

/// Player response.
#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub user_id: PlayerId,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<PlayerRow> for PlayerResponse {
    type Error = ApiError;

    fn try_from(row: PlayerRow) -> ApiResult<Self> {
        Ok(Self {
            user_id: row.id()?,
            username: row.username,
            created_at: row.created_at,
        })
    }
}

/// POST /api/players - Register a player.
pub async fn create_player(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<PlayerResponse>)> {
    let body: CreatePlayerRequest = read_json(req).await?;
    let username = validate_username(&body.username)?;

    let row = state.store.create_player(&username).await?;
    tracing::info!(player_id = row.player_id, username = %row.username, "Player created");

    Ok((StatusCode::CREATED, Json(row.try_into()?)))
}

/// GET /api/players/{user_id} - Look up a player.
pub async fn get_player(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PlayerResponse>> {
    let player_id = PlayerId::new(parse_user_id(&user_id)?)?;
    let row = state
        .store
        .get_player(player_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("player {player_id} not found")))?;
    Ok(Json(row.try_into()?))
}

/// Query parameters for the session history endpoint.
#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    pub limit: Option<u32>,
}

/// One recorded score event.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub event_id: i64,
    pub score: i64,
    pub game_mode: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ScoreEventRow> for SessionResponse {
    fn from(row: ScoreEventRow) -> Self {
        Self {
            event_id: row.event_id,
            score: row.delta,
            game_mode: row.game_mode,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub user_id: PlayerId,
    pub sessions: Vec<SessionResponse>,
}

/// GET /api/players/{user_id}/sessions - Most recent score events first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<SessionsQuery>,
) -> ApiResult<Json<SessionsResponse>> {
    let player_id = PlayerId::new(parse_user_id(&user_id)?)?;
    let limit = params.limit.unwrap_or(DEFAULT_SESSIONS_LIMIT);
    if limit == 0 || limit > MAX_SESSIONS_LIMIT {
        return Err(podium_core::Error::InvalidLimit {
            limit,
            max: MAX_SESSIONS_LIMIT,
        }
        .into());
    }

    if state.store.get_player(player_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("player {player_id} not found")));
    }

    let events = state.store.list_score_events(player_id, limit).await?;
    Ok(Json(SessionsResponse {
        user_id: player_id,
        sessions: events.into_iter().map(SessionResponse::from).collect(),
    }))
}
