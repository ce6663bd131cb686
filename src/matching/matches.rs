use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::AppResult;

/// The match row for a pair lookup, reduced to what re-detection needs.
pub struct PairMatch {
    pub id: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedUser {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
    pub bio: Option<String>,
    pub age: i64,
}

/// One entry in a user's match list, seen from their side: the other
/// user's card plus the chat to open.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: String,
    pub chat_id: String,
    pub matched_user: MatchedUser,
    pub created_at: String,
}

/// Find the match for an unordered pair, regardless of who swiped last.
pub fn find_for_pair(conn: &Connection, a: &str, b: &str) -> AppResult<Option<PairMatch>> {
    let result = conn.query_row(
        "SELECT id, chat_id FROM matches
         WHERE (from_user_id = ?1 AND to_user_id = ?2)
            OR (from_user_id = ?2 AND to_user_id = ?1)",
        params![a, b],
        |row| {
            Ok(PairMatch {
                id: row.get(0)?,
                chat_id: row.get(1)?,
            })
        },
    );

    match result {
        Ok(m) => Ok(Some(m)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All matches involving a user, newest first, each carrying the other
/// side's summary.
pub fn list_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<MatchView>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.chat_id, m.from_user_id, m.created_at,
                fu.id, fu.name, fu.images, fu.bio, fu.age,
                tu.id, tu.name, tu.images, tu.bio, tu.age
         FROM matches m
         JOIN users fu ON fu.id = m.from_user_id
         JOIN users tu ON tu.id = m.to_user_id
         WHERE m.from_user_id = ?1 OR m.to_user_id = ?1
         ORDER BY m.created_at DESC, m.id DESC",
    )?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                (
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                ),
                (
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, String>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, i64>(13)?,
                ),
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut views = Vec::with_capacity(rows.len());
    for (id, chat_id, from_user_id, created_at, from_user, to_user) in rows {
        // Show the side the requesting user matched with
        let (uid, name, images, bio, age) = if from_user_id == user_id {
            to_user
        } else {
            from_user
        };
        views.push(MatchView {
            id,
            chat_id,
            matched_user: MatchedUser {
                id: uid,
                name,
                images: serde_json::from_str(&images)?,
                bio,
                age,
            },
            created_at,
        });
    }
    Ok(views)
}
