use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use crate::db;
use crate::db::models::{ChatKind, Direction};
use crate::error::{AppError, AppResult};
use crate::matching::{ledger, matches};

/// What a swipe produced. `match_id` and `chat_id` are present exactly
/// when `is_match` is true.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeOutcome {
    pub is_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

impl SwipeOutcome {
    fn no_match() -> Self {
        Self {
            is_match: false,
            match_id: None,
            chat_id: None,
        }
    }

    fn matched(match_id: String, chat_id: String) -> Self {
        Self {
            is_match: true,
            match_id: Some(match_id),
            chat_id: Some(chat_id),
        }
    }
}

/// Record a swipe and, on a mutual LIKE, find or create the match and its
/// chat. Everything runs in one immediate transaction: SQLite serializes
/// writers, so two reciprocal swipes racing each other cannot both reach
/// the create step for the same pair. The unique index on the unordered
/// pair backs that up at the schema level.
///
/// A LIKE after an earlier PASS still counts; only LIKE rows take part in
/// reciprocity. Re-swiping a matched pair returns the existing match.
pub fn process_swipe(
    conn: &mut Connection,
    from_user_id: &str,
    to_user_id: &str,
    direction: Direction,
) -> AppResult<SwipeOutcome> {
    if from_user_id == to_user_id {
        return Err(AppError::BadRequest("You cannot swipe on yourself".into()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !db::user_exists(&tx, from_user_id)? || !db::user_exists(&tx, to_user_id)? {
        return Err(AppError::NotFound("User not found".into()));
    }

    ledger::record(&tx, from_user_id, to_user_id, direction)?;
    tracing::debug!(
        "Swipe recorded: {} -> {} ({})",
        from_user_id,
        to_user_id,
        direction.as_str()
    );

    let outcome = if direction == Direction::Like && ledger::has_like(&tx, to_user_id, from_user_id)?
    {
        match matches::find_for_pair(&tx, from_user_id, to_user_id)? {
            Some(existing) => SwipeOutcome::matched(existing.id, existing.chat_id),
            None => {
                let chat_id = uuid::Uuid::now_v7().to_string();
                tx.execute(
                    "INSERT INTO chats (id, kind, creator_id, participant_id)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![chat_id, ChatKind::Internal, from_user_id, to_user_id],
                )?;

                let match_id = uuid::Uuid::now_v7().to_string();
                tx.execute(
                    "INSERT INTO matches (id, from_user_id, to_user_id, chat_id)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![match_id, from_user_id, to_user_id, chat_id],
                )?;

                tracing::info!(
                    "Match created between {} and {} (chat {})",
                    from_user_id,
                    to_user_id,
                    chat_id
                );
                SwipeOutcome::matched(match_id, chat_id)
            }
        }
    } else {
        SwipeOutcome::no_match()
    };

    tx.commit()?;
    Ok(outcome)
}
