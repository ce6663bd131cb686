use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::chat::access::{self, ChatCredential};
use crate::chat::guest_links::{self, GuestLink};
use crate::chat::messages::{self, MessageWithSender, UserSummary};
use crate::db::models::{Chat, ChatKind};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// --- Request types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessagesQuery {
    pub chat_id: Option<String>,
    pub user_id: Option<String>,
    pub guest_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub content: String,
    pub sender_id: Option<String>,
    pub guest_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLinkRequest {
    pub chat_id: String,
    pub user_id: String,
}

// --- View structs ---

#[derive(Serialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub creator: UserSummary,
    pub participant: Option<UserSummary>,
}

#[derive(Serialize)]
pub struct ChatMessagesResponse {
    pub messages: Vec<MessageWithSender>,
    pub chat: ChatSummary,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/messages", get(get_messages).post(send_message))
        .route("/chat/external-link", post(external_link))
        .route("/chat/external/{token}", get(external_chat))
}

// --- Handlers ---

/// History plus thread metadata, for members and guests alike. Guests may
/// omit the chat id; their token names the chat. When both are sent the
/// token must belong to that exact chat.
async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<GetMessagesQuery>,
) -> AppResult<Json<ChatMessagesResponse>> {
    let credential =
        ChatCredential::from_parts(query.guest_token.as_deref(), query.user_id.as_deref());

    let conn = state.db.get()?;
    let chat = access::resolve_chat(&conn, query.chat_id.as_deref(), &credential)?;
    access::authorize(&chat, &credential)?;

    Ok(Json(chat_payload(&conn, &chat)?))
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<MessageWithSender>> {
    let credential =
        ChatCredential::from_parts(req.guest_token.as_deref(), req.sender_id.as_deref());

    let conn = state.db.get()?;
    let chat = access::chat_by_id(&conn, &req.chat_id)?;
    access::authorize(&chat, &credential)?;

    // Guests still attribute their messages to a user row
    let sender_id = req
        .sender_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Sender is required".into()))?;

    let message = messages::append(&conn, &chat.id, sender_id, &req.content)?;
    Ok(Json(message))
}

async fn external_link(
    State(state): State<AppState>,
    Json(req): Json<ExternalLinkRequest>,
) -> AppResult<Json<GuestLink>> {
    let mut conn = state.db.get()?;
    let link = guest_links::find_or_create(
        &mut conn,
        &state.config.external_link_base(),
        &req.chat_id,
        &req.user_id,
    )?;
    Ok(Json(link))
}

/// The page a shared guest link lands on: the same payload a guest gets
/// from the messages endpoint, addressed purely by token.
async fn external_chat(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ChatMessagesResponse>> {
    let conn = state.db.get()?;
    let chat = access::chat_by_guest_token(&conn, &token)?;
    access::authorize(&chat, &ChatCredential::Guest(token))?;

    Ok(Json(chat_payload(&conn, &chat)?))
}

// --- Helpers ---

fn chat_payload(conn: &Connection, chat: &Chat) -> AppResult<ChatMessagesResponse> {
    let creator = messages::user_summary(conn, &chat.creator_id)?;
    let participant = chat
        .participant_id
        .as_deref()
        .map(|id| messages::user_summary(conn, id))
        .transpose()?;

    Ok(ChatMessagesResponse {
        messages: messages::list(conn, &chat.id)?,
        chat: ChatSummary {
            id: chat.id.clone(),
            kind: chat.kind,
            creator,
            participant,
        },
    })
}
