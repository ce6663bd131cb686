use rand::Rng;
use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use crate::chat::access::{self, ChatCredential};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct GuestLink {
    pub url: String,
    pub token: String,
}

/// Generate a 256-bit guest token as 64 hex characters.
pub fn generate_guest_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

pub fn external_url(base_url: &str, token: &str) -> String {
    format!("{}/chat/external/{}", base_url.trim_end_matches('/'), token)
}

/// Return the chat's guest link, creating the token on first request.
///
/// Issuance is idempotent: a chat gets exactly one token for its lifetime,
/// and every later call returns the same link. The lookup and the store
/// run under one immediate transaction so two first requests racing each
/// other cannot issue different tokens. Only chat members may ask.
pub fn find_or_create(
    conn: &mut Connection,
    base_url: &str,
    chat_id: &str,
    user_id: &str,
) -> AppResult<GuestLink> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let chat = access::chat_by_id(&tx, chat_id)?;
    access::authorize(&chat, &ChatCredential::User(user_id.to_string()))?;

    let link = match chat.guest_token {
        Some(token) => GuestLink {
            url: external_url(base_url, &token),
            token,
        },
        None => {
            let token = generate_guest_token();
            tx.execute(
                "UPDATE chats SET guest_token = ?1 WHERE id = ?2",
                params![token, chat.id],
            )?;
            tracing::info!("Guest token issued for chat {}", chat.id);
            GuestLink {
                url: external_url(base_url, &token),
                token,
            }
        }
    };

    tx.commit()?;
    Ok(link)
}
