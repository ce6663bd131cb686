use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::models::{PartnerStatus, UserStatus};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// --- Request types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub admin_id: String,
    pub status: String,
}

// --- View structs ---

#[derive(Serialize)]
pub struct UserStatusView {
    pub id: String,
    pub status: UserStatus,
}

#[derive(Serialize)]
pub struct PartnerStatusView {
    pub id: String,
    pub status: PartnerStatus,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users/{id}/status", put(set_user_status))
        .route("/admin/partners/{id}/status", put(set_partner_status))
}

// --- Handlers ---

async fn set_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> AppResult<Json<UserStatusView>> {
    let conn = state.db.get()?;
    require_admin(&conn, &req.admin_id)?;

    let status = UserStatus::parse(&req.status)
        .ok_or_else(|| AppError::BadRequest("Invalid status".into()))?;

    let updated = conn.execute(
        "UPDATE users SET status = ?1 WHERE id = ?2",
        params![status, user_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(
        "Admin {} set user {} status to {}",
        req.admin_id,
        user_id,
        status.as_str()
    );
    Ok(Json(UserStatusView {
        id: user_id,
        status,
    }))
}

async fn set_partner_status(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> AppResult<Json<PartnerStatusView>> {
    let conn = state.db.get()?;
    require_admin(&conn, &req.admin_id)?;

    let status = PartnerStatus::parse(&req.status)
        .ok_or_else(|| AppError::BadRequest("Invalid status".into()))?;

    let updated = conn.execute(
        "UPDATE partners SET status = ?1 WHERE id = ?2",
        params![status, partner_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound("Partner not found".into()));
    }

    tracing::info!(
        "Admin {} set partner {} status to {}",
        req.admin_id,
        partner_id,
        status.as_str()
    );
    Ok(Json(PartnerStatusView {
        id: partner_id,
        status,
    }))
}

// --- Helpers ---

fn require_admin(conn: &Connection, admin_id: &str) -> AppResult<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM admins WHERE id = ?1",
        params![admin_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::Unauthorized("Access denied".into()));
    }
    Ok(())
}
