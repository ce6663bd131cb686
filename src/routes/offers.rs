use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::models::PartnerStatus;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// --- Request types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub partner_id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub datetime: String,
    pub location: String,
    pub image_url: String,
    pub sport: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerQuery {
    pub partner_id: String,
}

// --- View structs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    pub id: String,
    pub partner_id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub datetime: String,
    pub location: String,
    pub image_url: String,
    pub sport: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct DeleteOfferResponse {
    pub success: bool,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offers", post(create_offer))
        .route("/offers/mine", get(get_my_offers))
        .route("/offers/available", get(get_available_offers))
        .route("/offers/{id}", delete(delete_offer))
}

// --- Handlers ---

async fn create_offer(
    State(state): State<AppState>,
    Json(req): Json<CreateOfferRequest>,
) -> AppResult<Json<OfferView>> {
    let conn = state.db.get()?;
    require_approved_partner(&conn, &req.partner_id)?;

    let title = req.title.trim().to_string();
    if title.chars().count() < 3 {
        return Err(AppError::BadRequest(
            "Title must be at least 3 characters".into(),
        ));
    }
    if req.price <= 0.0 {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }
    if req.description.trim().chars().count() < 10 {
        return Err(AppError::BadRequest(
            "Description must be at least 10 characters".into(),
        ));
    }
    if req.location.trim().chars().count() < 3 {
        return Err(AppError::BadRequest(
            "Location must be at least 3 characters".into(),
        ));
    }
    if req.sport.trim().chars().count() < 2 {
        return Err(AppError::BadRequest(
            "Sport must be at least 2 characters".into(),
        ));
    }
    // Normalize to the storage format so date comparisons stay lexicographic
    let datetime = DateTime::parse_from_rfc3339(&req.datetime)
        .map_err(|_| AppError::BadRequest("Datetime must be a valid RFC 3339 date".into()))?
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    if Url::parse(&req.image_url).is_err() {
        return Err(AppError::BadRequest("The image URL is not valid".into()));
    }

    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO offers
             (id, partner_id, title, price, description, datetime, location, image_url, sport)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            req.partner_id,
            title,
            req.price,
            req.description,
            datetime,
            req.location,
            req.image_url,
            req.sport,
        ],
    )?;

    let offer = load_offer(&conn, &id)?;
    Ok(Json(offer))
}

async fn get_my_offers(
    State(state): State<AppState>,
    Query(query): Query<PartnerQuery>,
) -> AppResult<Json<Vec<OfferView>>> {
    let conn = state.db.get()?;
    let offers = query_offers(
        &conn,
        "SELECT id, partner_id, title, price, description, datetime, location,
                image_url, sport, is_active, created_at
         FROM offers WHERE partner_id = ?1
         ORDER BY created_at DESC",
        params![query.partner_id],
    )?;
    Ok(Json(offers))
}

/// Active offers that have not started yet, soonest first. This is the
/// browse surface users see.
async fn get_available_offers(State(state): State<AppState>) -> AppResult<Json<Vec<OfferView>>> {
    let conn = state.db.get()?;
    let offers = query_offers(
        &conn,
        "SELECT id, partner_id, title, price, description, datetime, location,
                image_url, sport, is_active, created_at
         FROM offers
         WHERE is_active = 1 AND datetime > strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         ORDER BY datetime ASC",
        [],
    )?;
    Ok(Json(offers))
}

async fn delete_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Query(query): Query<PartnerQuery>,
) -> AppResult<Json<DeleteOfferResponse>> {
    let conn = state.db.get()?;
    require_approved_partner(&conn, &query.partner_id)?;

    let owner_id: String = conn
        .query_row(
            "SELECT partner_id FROM offers WHERE id = ?1",
            params![offer_id],
            |row| row.get(0),
        )
        .map_err(|_| AppError::NotFound("Offer not found".into()))?;

    if owner_id != query.partner_id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this offer".into(),
        ));
    }

    conn.execute("DELETE FROM offers WHERE id = ?1", params![offer_id])?;
    Ok(Json(DeleteOfferResponse { success: true }))
}

// --- Helpers ---

fn require_approved_partner(conn: &Connection, partner_id: &str) -> AppResult<()> {
    let status: PartnerStatus = conn
        .query_row(
            "SELECT status FROM partners WHERE id = ?1",
            params![partner_id],
            |row| row.get(0),
        )
        .map_err(|_| AppError::NotFound("Partner not found".into()))?;

    if status != PartnerStatus::Approved {
        return Err(AppError::Forbidden(
            "Your account must be approved to perform this action".into(),
        ));
    }
    Ok(())
}

fn query_offers<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> AppResult<Vec<OfferView>> {
    let mut stmt = conn.prepare(sql)?;
    let offers = stmt
        .query_map(params, |row| {
            Ok(OfferView {
                id: row.get(0)?,
                partner_id: row.get(1)?,
                title: row.get(2)?,
                price: row.get(3)?,
                description: row.get(4)?,
                datetime: row.get(5)?,
                location: row.get(6)?,
                image_url: row.get(7)?,
                sport: row.get(8)?,
                is_active: row.get(9)?,
                created_at: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(offers)
}

fn load_offer(conn: &Connection, offer_id: &str) -> AppResult<OfferView> {
    conn.query_row(
        "SELECT id, partner_id, title, price, description, datetime, location,
                image_url, sport, is_active, created_at
         FROM offers WHERE id = ?1",
        params![offer_id],
        |row| {
            Ok(OfferView {
                id: row.get(0)?,
                partner_id: row.get(1)?,
                title: row.get(2)?,
                price: row.get(3)?,
                description: row.get(4)?,
                datetime: row.get(5)?,
                location: row.get(6)?,
                image_url: row.get(7)?,
                sport: row.get(8)?,
                is_active: row.get(9)?,
                created_at: row.get(10)?,
            })
        },
    )
    .map_err(|_| AppError::NotFound("Offer not found".into()))
}
