use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub const MAX_MESSAGE_CHARS: usize = 500;

/// The sender card attached to every message: enough for the chat screen,
/// nothing private.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithSender {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
    pub sender: UserSummary,
}

pub fn user_summary(conn: &Connection, user_id: &str) -> AppResult<UserSummary> {
    let (id, name, images): (String, String, String) = conn
        .query_row(
            "SELECT id, name, images FROM users WHERE id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|_| AppError::NotFound("User not found".into()))?;

    Ok(UserSummary {
        id,
        name,
        images: serde_json::from_str(&images)?,
    })
}

/// Check and normalize message content. Whitespace-only messages are
/// rejected, oversized ones are refused outright rather than truncated.
pub fn validate_content(content: &str) -> AppResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".into()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message must be {} characters or less",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(content.to_string())
}

/// Append a message to a chat the caller has already been authorized for.
/// The stored timestamp comes from the database clock so that ordering is
/// consistent across senders.
pub fn append(
    conn: &Connection,
    chat_id: &str,
    sender_id: &str,
    content: &str,
) -> AppResult<MessageWithSender> {
    let content = validate_content(content)?;
    let sender = user_summary(conn, sender_id)?;

    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO messages (id, chat_id, sender_id, content)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, chat_id, sender_id, content],
    )?;

    let created_at: String = conn.query_row(
        "SELECT created_at FROM messages WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;

    Ok(MessageWithSender {
        id,
        chat_id: chat_id.to_string(),
        sender_id: sender_id.to_string(),
        content,
        created_at,
        sender,
    })
}

/// Full message history for a chat in send order. Timestamps share
/// milliseconds under load, so the id breaks ties; ids are time-ordered
/// UUIDs, which keeps the order stable across reads.
pub fn list(conn: &Connection, chat_id: &str) -> AppResult<Vec<MessageWithSender>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.chat_id, m.sender_id, m.content, m.created_at,
                u.id, u.name, u.images
         FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE m.chat_id = ?1
         ORDER BY m.created_at ASC, m.id ASC",
    )?;

    let rows = stmt
        .query_map(params![chat_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut messages = Vec::with_capacity(rows.len());
    for (id, chat_id, sender_id, content, created_at, uid, name, images) in rows {
        messages.push(MessageWithSender {
            id,
            chat_id,
            sender_id,
            content,
            created_at,
            sender: UserSummary {
                id: uid,
                name,
                images: serde_json::from_str(&images)?,
            },
        });
    }
    Ok(messages)
}
