use anyhow::Result;
use rusqlite::Row;

use super::{FeedWindow, OptionalExt};
use crate::Database;
use crate::models::ChatMessageRow;

impl Database {
    // -- Chat rooms --
    //
    // `community_id` is None for the global room. Queries compare with `IS`
    // so NULL selects exactly the global partition.

    pub fn insert_chat_message(
        &self,
        id: &str,
        community_id: Option<&str>,
        user_id: &str,
        body: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, community_id, user_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, community_id, user_id, body, created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_chat_message(&self, id: &str) -> Result<Option<ChatMessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT m.id, m.community_id, m.user_id, COALESCE(u.username, 'unknown'),
                        m.body, m.created_at
                 FROM chat_messages m
                 LEFT JOIN users u ON u.id = m.user_id
                 WHERE m.id = ?1",
                [id],
                chat_message_from_row,
            )
            .optional()
        })
    }

    /// Window of one partition, oldest first.
    pub fn get_chat_messages(
        &self,
        community_id: Option<&str>,
        window: &FeedWindow,
    ) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, community_id, user_id, username, body, created_at
                 FROM (
                     SELECT m.rowid AS seq, m.id, m.community_id, m.user_id,
                            COALESCE(u.username, 'unknown') AS username,
                            m.body, m.created_at
                     FROM chat_messages m
                     LEFT JOIN users u ON u.id = m.user_id
                     WHERE m.community_id IS ?1 AND (?2 IS NULL OR m.created_at < ?2)
                     ORDER BY m.created_at DESC, m.rowid DESC
                     LIMIT ?3
                 )
                 ORDER BY created_at ASC, seq ASC",
            )?;

            let rows = stmt
                .query_map(
                    rusqlite::params![community_id, window.before, window.effective_limit()],
                    chat_message_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_chat_message(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM chat_messages WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn chat_message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessageRow> {
    Ok(ChatMessageRow {
        id: row.get(0)?,
        community_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}
