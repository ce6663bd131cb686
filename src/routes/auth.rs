use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::models::{PartnerStatus, UserStatus};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// --- Request types ---

#[derive(Deserialize)]
pub struct UserRegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub bio: Option<String>,
    pub location: String,
    pub sports: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRegisterRequest {
    pub email: String,
    pub password: String,
    pub company_name: String,
    pub description: Option<String>,
    pub website_link: Option<String>,
    pub address: String,
}

// --- View structs ---

#[derive(Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
}

#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub bio: Option<String>,
    pub location: String,
    pub sports: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredPartner {
    pub id: String,
    pub email: String,
    pub company_name: String,
    pub status: PartnerStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerProfile {
    pub id: String,
    pub email: String,
    pub company_name: String,
    pub status: PartnerStatus,
    pub description: Option<String>,
    pub website_link: Option<String>,
    pub address: String,
}

#[derive(Serialize)]
pub struct AdminProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(user_register))
        .route("/auth/login", post(user_login))
        .route("/auth/partner/register", post(partner_register))
        .route("/auth/partner/login", post(partner_login))
        .route("/auth/admin/login", post(admin_login))
}

// --- Handlers ---

async fn user_register(
    State(state): State<AppState>,
    Json(req): Json<UserRegisterRequest>,
) -> AppResult<Json<RegisteredUser>> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let name = req.name.trim().to_string();
    if name.chars().count() < 2 {
        return Err(AppError::BadRequest(
            "Name must be at least 2 characters".into(),
        ));
    }
    if req.age < 18 {
        return Err(AppError::BadRequest(
            "You must be at least 18 years old".into(),
        ));
    }
    if req.sports.is_empty() {
        return Err(AppError::BadRequest("At least one sport is required".into()));
    }
    if req.images.is_empty() || req.images.len() > 5 {
        return Err(AppError::BadRequest(
            "Between 1 and 5 images are required".into(),
        ));
    }
    for (i, image) in req.images.iter().enumerate() {
        if Url::parse(image).is_err() {
            return Err(AppError::BadRequest(format!(
                "Image {} is not a valid URL",
                i + 1
            )));
        }
    }

    let conn = state.db.get()?;
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![req.email],
        |row| row.get(0),
    )?;
    if taken {
        return Err(AppError::Conflict(
            "A user with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO users
             (id, email, password_hash, name, age, gender, bio, location, sports, images, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            req.email,
            password_hash,
            name,
            req.age,
            req.gender,
            req.bio,
            req.location,
            serde_json::to_string(&req.sports)?,
            serde_json::to_string(&req.images)?,
            UserStatus::Active,
        ],
    )?;

    Ok(Json(RegisteredUser {
        id,
        email: req.email,
        name,
        status: UserStatus::Active,
    }))
}

async fn user_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<UserProfile>> {
    let conn = state.db.get()?;

    let row = conn
        .query_row(
            "SELECT id, password_hash, name, status, bio, location, sports, images
             FROM users WHERE email = ?1",
            params![req.email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, UserStatus>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .map_err(|_| AppError::Unauthorized("Invalid email or password".into()))?;

    let (id, password_hash, name, status, bio, location, sports, images) = row;

    if status == UserStatus::Blocked {
        return Err(AppError::Forbidden(
            "Your account has been blocked. Contact support.".into(),
        ));
    }
    if !bcrypt::verify(&req.password, &password_hash).unwrap_or(false) {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    Ok(Json(UserProfile {
        id,
        email: req.email,
        name,
        status,
        bio,
        location,
        sports: serde_json::from_str(&sports)?,
        images: serde_json::from_str(&images)?,
    }))
}

async fn partner_register(
    State(state): State<AppState>,
    Json(req): Json<PartnerRegisterRequest>,
) -> AppResult<Json<RegisteredPartner>> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let company_name = req.company_name.trim().to_string();
    if company_name.chars().count() < 2 {
        return Err(AppError::BadRequest(
            "Company name must be at least 2 characters".into(),
        ));
    }
    if let Some(link) = req.website_link.as_deref().filter(|l| !l.is_empty()) {
        if Url::parse(link).is_err() {
            return Err(AppError::BadRequest(
                "Website link is not a valid URL".into(),
            ));
        }
    }

    let conn = state.db.get()?;
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM partners WHERE email = ?1",
        params![req.email],
        |row| row.get(0),
    )?;
    if taken {
        return Err(AppError::Conflict(
            "A partner with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO partners
             (id, email, password_hash, company_name, description, website_link, address, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            req.email,
            password_hash,
            company_name,
            req.description,
            req.website_link,
            req.address,
            PartnerStatus::Pending,
        ],
    )?;

    Ok(Json(RegisteredPartner {
        id,
        email: req.email,
        company_name,
        status: PartnerStatus::Pending,
    }))
}

async fn partner_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<PartnerProfile>> {
    let conn = state.db.get()?;

    let row = conn
        .query_row(
            "SELECT id, password_hash, company_name, status, description, website_link, address
             FROM partners WHERE email = ?1",
            params![req.email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, PartnerStatus>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .map_err(|_| AppError::Unauthorized("Invalid email or password".into()))?;

    let (id, password_hash, company_name, status, description, website_link, address) = row;

    if !bcrypt::verify(&req.password, &password_hash).unwrap_or(false) {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    Ok(Json(PartnerProfile {
        id,
        email: req.email,
        company_name,
        status,
        description,
        website_link,
        address,
    }))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AdminProfile>> {
    let conn = state.db.get()?;

    let row = conn
        .query_row(
            "SELECT id, password_hash, name FROM admins WHERE email = ?1",
            params![req.email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .map_err(|_| AppError::Unauthorized("Access denied".into()))?;

    let (id, password_hash, name) = row;

    if !bcrypt::verify(&req.password, &password_hash).unwrap_or(false) {
        return Err(AppError::Unauthorized("Access denied".into()));
    }

    Ok(Json(AdminProfile {
        id,
        email: req.email,
        name,
    }))
}

// --- Validation helpers ---

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}
