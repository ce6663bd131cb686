use rusqlite::{params, Connection};

use crate::db::models::Chat;
use crate::error::{AppError, AppResult};

/// How a request identifies itself to a chat. When both a guest token and
/// a user id are presented, the guest token wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCredential {
    Guest(String),
    User(String),
    None,
}

impl ChatCredential {
    /// Build a credential from optional wire fields. Empty strings count
    /// as absent; clients send `""` for fields they do not use.
    pub fn from_parts(guest_token: Option<&str>, user_id: Option<&str>) -> Self {
        match (
            guest_token.filter(|t| !t.is_empty()),
            user_id.filter(|u| !u.is_empty()),
        ) {
            (Some(token), _) => ChatCredential::Guest(token.to_string()),
            (None, Some(id)) => ChatCredential::User(id.to_string()),
            (None, None) => ChatCredential::None,
        }
    }
}

/// Decide whether a credential may read and write a chat.
///
/// Guest tokens must equal the chat's stored token exactly; a chat that
/// never issued one rejects every guest. User ids must be the creator or
/// the participant. No credential at all is unauthorized rather than
/// forbidden, so clients can distinguish "log in" from "not yours".
pub fn authorize(chat: &Chat, credential: &ChatCredential) -> AppResult<()> {
    match credential {
        ChatCredential::Guest(token) => {
            if chat.guest_token.as_deref() == Some(token.as_str()) {
                Ok(())
            } else {
                Err(AppError::Forbidden("Invalid guest token".into()))
            }
        }
        ChatCredential::User(user_id) => {
            if chat.creator_id == *user_id
                || chat.participant_id.as_deref() == Some(user_id.as_str())
            {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You don't have access to this chat".into(),
                ))
            }
        }
        ChatCredential::None => Err(AppError::Unauthorized("Authentication required".into())),
    }
}

pub fn chat_by_id(conn: &Connection, chat_id: &str) -> AppResult<Chat> {
    conn.query_row(
        "SELECT id, kind, creator_id, participant_id, guest_token, created_at
         FROM chats WHERE id = ?1",
        params![chat_id],
        chat_from_row,
    )
    .map_err(|_| AppError::NotFound("Chat not found".into()))
}

pub fn chat_by_guest_token(conn: &Connection, token: &str) -> AppResult<Chat> {
    conn.query_row(
        "SELECT id, kind, creator_id, participant_id, guest_token, created_at
         FROM chats WHERE guest_token = ?1",
        params![token],
        chat_from_row,
    )
    .map_err(|_| AppError::NotFound("Chat not found".into()))
}

/// Resolve the chat a request is talking about. An explicit chat id wins;
/// a guest token alone resolves through the token. With neither there is
/// nothing to look up.
pub fn resolve_chat(
    conn: &Connection,
    chat_id: Option<&str>,
    credential: &ChatCredential,
) -> AppResult<Chat> {
    match chat_id.filter(|id| !id.is_empty()) {
        Some(id) => chat_by_id(conn, id),
        None => match credential {
            ChatCredential::Guest(token) => chat_by_guest_token(conn, token),
            _ => Err(AppError::NotFound("Chat not found".into())),
        },
    }
}

fn chat_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        kind: row.get(1)?,
        creator_id: row.get(2)?,
        participant_id: row.get(3)?,
        guest_token: row.get(4)?,
        created_at: row.get(5)?,
    })
}
