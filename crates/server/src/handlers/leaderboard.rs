//! Leaderboard endpoints: submit, top-N, and per-player rank.

use super::common::{parse_user_id, read_json};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use podium_core::{PlayerId, PlayerStanding, RankStatus, TopSnapshot};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Submit score request.
#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub user_id: i64,
    /// Score delta for this event.
    pub score: i64,
    #[serde(default)]
    pub game_mode: Option<String>,
}

/// Submit score response.
#[derive(Debug, Serialize)]
pub struct SubmitScoreResponse {
    pub event_id: i64,
    pub user_id: PlayerId,
    pub score: i64,
    pub total_score: i64,
}

/// POST /api/leaderboard/submit - Record a score event.
pub async fn submit_score(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<SubmitScoreResponse>)> {
    let body: SubmitScoreRequest = read_json(req).await?;

    let receipt = state
        .leaderboard
        .submit_score(body.user_id, body.score, body.game_mode.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitScoreResponse {
            event_id: receipt.event_id,
            user_id: receipt.player_id,
            score: receipt.delta,
            total_score: receipt.new_total,
        }),
    ))
}

/// Query parameters for the top-N endpoint.
#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TopEntryResponse {
    pub rank: u64,
    pub user_id: PlayerId,
    pub username: String,
    pub total_score: i64,
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub entries: Vec<TopEntryResponse>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl From<TopSnapshot> for TopResponse {
    fn from(snapshot: TopSnapshot) -> Self {
        Self {
            entries: snapshot
                .entries
                .into_iter()
                .map(|entry| TopEntryResponse {
                    rank: entry.rank,
                    user_id: entry.player_id,
                    username: entry.username,
                    total_score: entry.total_score,
                })
                .collect(),
            generated_at: snapshot.generated_at,
        }
    }
}

/// GET /api/leaderboard/top - Highest totals first.
pub async fn get_top(
    State(state): State<AppState>,
    Query(params): Query<TopQuery>,
) -> ApiResult<Json<TopResponse>> {
    let limit = params
        .limit
        .unwrap_or(state.config.server.default_top_n);
    let snapshot = state.leaderboard.get_top_n(limit).await?;
    Ok(Json(snapshot.into()))
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub user_id: PlayerId,
    pub rank: Option<u64>,
    pub total_score: i64,
    pub status: RankStatus,
}

impl From<PlayerStanding> for RankResponse {
    fn from(standing: PlayerStanding) -> Self {
        Self {
            user_id: standing.player_id,
            rank: standing.rank,
            total_score: standing.total_score,
            status: standing.status,
        }
    }
}

/// GET /api/leaderboard/rank/{user_id} - One player's position.
pub async fn get_rank(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RankResponse>> {
    let user_id = parse_user_id(&user_id)?;
    let standing = state.leaderboard.get_player_rank(user_id).await?;
    Ok(Json(standing.into()))
}
