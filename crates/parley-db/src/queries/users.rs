use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::models::UserRow;
use crate::{Database, now_timestamp};

impl Database {
    /// Returns false when the username (compared case-insensitively) is taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(username) DO NOTHING",
                (id, username, password_hash, now_timestamp()),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Case-insensitive lookup.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Substring match on username, excluding `exclude_id`.
    pub fn search_users(&self, needle: &str, exclude_id: &str, limit: u32) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", escape_like(needle));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, created_at FROM users
                 WHERE username LIKE ?1 ESCAPE '\\' AND id != ?2
                 ORDER BY username
                 LIMIT ?3",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![pattern, exclude_id, limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
