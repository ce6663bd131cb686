use std::collections::HashSet;

use rusqlite::{params, Connection};

use crate::db::models::Direction;
use crate::error::AppResult;

/// Append a swipe. The ledger is append-only: re-swiping the same target
/// adds another row, it never updates an earlier decision.
pub fn record(
    conn: &Connection,
    from_user_id: &str,
    to_user_id: &str,
    direction: Direction,
) -> AppResult<String> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO swipes (id, from_user_id, to_user_id, direction)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, from_user_id, to_user_id, direction],
    )?;
    Ok(id)
}

/// Every user this user has ever swiped on, in either direction of
/// decision. Duplicate swipes collapse to one entry.
pub fn swiped_targets(conn: &Connection, from_user_id: &str) -> AppResult<HashSet<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT to_user_id FROM swipes WHERE from_user_id = ?1")?;
    let targets = stmt
        .query_map(params![from_user_id], |row| row.get(0))?
        .collect::<Result<HashSet<String>, _>>()?;
    Ok(targets)
}

/// Whether at least one LIKE from `from_user_id` to `to_user_id` exists.
pub fn has_like(conn: &Connection, from_user_id: &str, to_user_id: &str) -> AppResult<bool> {
    let liked: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM swipes
         WHERE from_user_id = ?1 AND to_user_id = ?2 AND direction = 'LIKE'",
        params![from_user_id, to_user_id],
        |row| row.get(0),
    )?;
    Ok(liked)
}
