use anyhow::Result;
use rusqlite::TransactionBehavior;

use crate::models::ReactionRow;
use crate::{Database, now_timestamp};

/// Which reaction table a message's reactions live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Direct,
    Chat,
}

impl ReactionKind {
    fn table(self) -> &'static str {
        match self {
            Self::Direct => "dm_reactions",
            Self::Chat => "chat_reactions",
        }
    }
}

impl Database {
    // -- Reactions --

    /// Replace whatever reaction `user_id` has on the message with `emoji`.
    /// Delete and insert share one transaction, so a (message, user) pair
    /// never has two rows.
    pub fn replace_reaction(
        &self,
        kind: ReactionKind,
        id: &str,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<()> {
        let table = kind.table();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                &format!("DELETE FROM {} WHERE message_id = ?1 AND user_id = ?2", table),
                [message_id, user_id],
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO {} (id, message_id, user_id, emoji, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    table
                ),
                rusqlite::params![id, message_id, user_id, emoji, now_timestamp()],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Returns true when a matching row was removed.
    pub fn delete_reaction(
        &self,
        kind: ReactionKind,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<bool> {
        let table = kind.table();
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
                    table
                ),
                [message_id, user_id, emoji],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Batch-fetch reactions for a set of message IDs.
    pub fn get_reactions_for_messages(
        &self,
        kind: ReactionKind,
        message_ids: &[String],
    ) -> Result<Vec<ReactionRow>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        let table = kind.table();
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=message_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT r.message_id, r.user_id, COALESCE(u.username, 'unknown'), r.emoji
                 FROM {} r
                 LEFT JOIN users u ON u.id = r.user_id
                 WHERE r.message_id IN ({})
                 ORDER BY r.created_at, r.rowid",
                table,
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = message_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ReactionRow {
                        message_id: row.get(0)?,
                        user_id: row.get(1)?,
                        username: row.get(2)?,
                        emoji: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
