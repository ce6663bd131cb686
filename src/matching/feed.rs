use rusqlite::{params_from_iter, Connection, ToSql};
use serde::Serialize;

use crate::error::AppResult;
use crate::matching::ledger;

/// A candidate card. Contact details (email) and moderation state stay
/// server-side; the card carries only what the swipe screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct FeedUser {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub bio: Option<String>,
    pub images: Vec<String>,
    pub sports: Vec<String>,
    pub location: String,
}

/// The next candidates for a user: everyone except themselves, anyone they
/// already swiped on, and BLOCKED or INVISIBLE accounts. Newest profiles
/// first. There is no cursor; an exhausted feed is just an empty list.
pub fn candidates(conn: &Connection, user_id: &str, limit: i64) -> AppResult<Vec<FeedUser>> {
    let mut excluded: Vec<String> = vec![user_id.to_string()];
    excluded.extend(ledger::swiped_targets(conn, user_id)?);

    let placeholders = (1..=excluded.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, name, age, bio, images, sports, location
         FROM users
         WHERE id NOT IN ({placeholders})
           AND status NOT IN ('BLOCKED', 'INVISIBLE')
         ORDER BY created_at DESC, id DESC
         LIMIT ?{}",
        excluded.len() + 1
    );

    let limit = limit.max(0);
    let mut values: Vec<&dyn ToSql> = excluded.iter().map(|id| id as &dyn ToSql).collect();
    values.push(&limit);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut users = Vec::with_capacity(rows.len());
    for (id, name, age, bio, images, sports, location) in rows {
        users.push(FeedUser {
            id,
            name,
            age,
            bio,
            images: serde_json::from_str(&images)?,
            sports: serde_json::from_str(&sports)?,
            location,
        });
    }
    Ok(users)
}
