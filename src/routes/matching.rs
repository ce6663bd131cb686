use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::Direction;
use crate::error::{AppError, AppResult};
use crate::matching::{detector, feed, matches};
use crate::state::AppState;

const DEFAULT_FEED_LIMIT: i64 = 20;

// --- Request types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub current_user_id: String,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub current_user_id: String,
    pub target_user_id: String,
    pub direction: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesQuery {
    pub current_user_id: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matching/feed", get(get_feed))
        .route("/matching/swipe", post(swipe))
        .route("/matching/matches", get(get_matches))
}

// --- Handlers ---

async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<feed::FeedUser>>> {
    let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT);
    let conn = state.db.get()?;
    let users = feed::candidates(&conn, &query.current_user_id, limit)?;
    Ok(Json(users))
}

async fn swipe(
    State(state): State<AppState>,
    Json(req): Json<SwipeRequest>,
) -> AppResult<Json<detector::SwipeOutcome>> {
    let direction = Direction::parse(&req.direction)
        .ok_or_else(|| AppError::BadRequest("Invalid swipe direction".into()))?;

    let mut conn = state.db.get()?;
    let outcome = detector::process_swipe(
        &mut conn,
        &req.current_user_id,
        &req.target_user_id,
        direction,
    )?;
    Ok(Json(outcome))
}

async fn get_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchesQuery>,
) -> AppResult<Json<Vec<matches::MatchView>>> {
    let conn = state.db.get()?;
    let list = matches::list_for_user(&conn, &query.current_user_id)?;
    Ok(Json(list))
}
