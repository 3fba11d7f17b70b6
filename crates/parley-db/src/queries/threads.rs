use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, TransactionBehavior};
use tracing::debug;

use super::{FeedWindow, OptionalExt};
use crate::models::{ConversationRow, DirectMessageRow, ThreadSummaryRow};
use crate::{Database, now_timestamp};

/// Order-independent key of a participant pair.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

impl Database {
    // -- Threads --

    /// The 1:1 conversation between `a` and `b`, if one exists.
    #[cfg(test)]
    pub fn find_thread_between(&self, a: &str, b: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| query_thread_between(conn, a, b))
    }

    /// Returns the existing 1:1 conversation for the pair, or creates one with
    /// id `new_id`. The bool is true when a conversation was created.
    pub fn find_or_create_thread(
        &self,
        new_id: &str,
        a: &str,
        b: &str,
    ) -> Result<(ConversationRow, bool)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if let Some(existing) = query_thread_between(&tx, a, b)? {
                tx.commit()?;
                return Ok((existing, false));
            }

            let key = pair_key(a, b);
            let now = now_timestamp();
            let inserted = tx.execute(
                "INSERT INTO conversations (id, pair_key, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(pair_key) DO NOTHING",
                rusqlite::params![new_id, key, now],
            )?;

            if inserted == 0 {
                // Another writer created the pair between our lookup and insert
                let existing = query_conversation_by_pair_key(&tx, &key)?
                    .ok_or_else(|| anyhow!("Conversation for pair {} vanished", key))?;
                tx.commit()?;
                debug!("Thread {} already created concurrently", existing.id);
                return Ok((existing, false));
            }

            tx.execute(
                "INSERT INTO conversation_participants (conversation_id, user_id) VALUES (?1, ?2), (?1, ?3)",
                rusqlite::params![new_id, a, b],
            )?;
            tx.commit()?;

            Ok((
                ConversationRow {
                    id: new_id.to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                },
                true,
            ))
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, created_at, updated_at FROM conversations WHERE id = ?1",
                [id],
                conversation_from_row,
            )
            .optional()
        })
    }

    pub fn is_participant(&self, conversation_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM conversation_participants WHERE conversation_id = ?1 AND user_id = ?2",
                    [conversation_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// All 1:1 threads of `user_id`, most recently active first.
    pub fn list_threads_for_user(&self, user_id: &str) -> Result<Vec<ThreadSummaryRow>> {
        self.with_conn(|conn| query_thread_summaries(conn, user_id, None))
    }

    /// Summary of one thread as seen by `user_id`. None when the thread does
    /// not exist or `user_id` is not in it.
    pub fn get_thread_summary(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ThreadSummaryRow>> {
        self.with_conn(|conn| {
            let rows = query_thread_summaries(conn, user_id, Some(conversation_id))?;
            Ok(rows.into_iter().next())
        })
    }

    // -- Direct messages --

    /// Insert a message and bump the thread's `updated_at` in one transaction.
    pub fn insert_direct_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO direct_messages (id, conversation_id, sender_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, conversation_id, sender_id, body, created_at],
            )?;
            tx.execute(
                "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
                rusqlite::params![conversation_id, created_at],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_direct_message(&self, id: &str) -> Result<Option<DirectMessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT m.id, m.conversation_id, m.sender_id, COALESCE(u.username, 'unknown'),
                        m.body, m.is_read, m.created_at
                 FROM direct_messages m
                 LEFT JOIN users u ON u.id = m.sender_id
                 WHERE m.id = ?1",
                [id],
                direct_message_from_row,
            )
            .optional()
        })
    }

    pub fn delete_direct_message(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM direct_messages WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Window of a thread's messages, oldest first. Read state is untouched.
    #[cfg(test)]
    pub fn get_direct_messages(
        &self,
        conversation_id: &str,
        window: &FeedWindow,
    ) -> Result<Vec<DirectMessageRow>> {
        self.with_conn(|conn| query_direct_messages(conn, conversation_id, window))
    }

    /// Marks every unread message in the thread not sent by `reader_id` as
    /// read, then returns the window. Both happen in one transaction so the
    /// returned rows carry the updated flags.
    pub fn read_direct_messages(
        &self,
        conversation_id: &str,
        reader_id: &str,
        window: &FeedWindow,
    ) -> Result<Vec<DirectMessageRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let marked = tx.execute(
                "UPDATE direct_messages SET is_read = 1
                 WHERE conversation_id = ?1 AND sender_id != ?2 AND is_read = 0",
                [conversation_id, reader_id],
            )?;
            let rows = query_direct_messages(&tx, conversation_id, window)?;
            tx.commit()?;

            if marked > 0 {
                debug!("Marked {} messages read in thread {}", marked, conversation_id);
            }
            Ok(rows)
        })
    }
}

fn query_thread_between(conn: &Connection, a: &str, b: &str) -> Result<Option<ConversationRow>> {
    conn.query_row(
        "SELECT c.id, c.created_at, c.updated_at
         FROM conversations c
         JOIN conversation_participants p ON p.conversation_id = c.id
         WHERE c.id IN (SELECT conversation_id FROM conversation_participants WHERE user_id = ?1)
         GROUP BY c.id
         HAVING COUNT(DISTINCT p.user_id) = 2
            AND SUM(p.user_id = ?1) = 1
            AND SUM(p.user_id = ?2) = 1
         ORDER BY c.updated_at DESC
         LIMIT 1",
        [a, b],
        conversation_from_row,
    )
    .optional()
}

fn query_thread_summaries(
    conn: &Connection,
    user_id: &str,
    conversation_id: Option<&str>,
) -> Result<Vec<ThreadSummaryRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.updated_at, o.id, o.username,
                (SELECT COUNT(*) FROM direct_messages u
                  WHERE u.conversation_id = c.id AND u.sender_id != ?1 AND u.is_read = 0),
                lm.sender_id, lm.body, lm.created_at
         FROM conversations c
         JOIN conversation_participants me ON me.conversation_id = c.id AND me.user_id = ?1
         JOIN conversation_participants op ON op.conversation_id = c.id AND op.user_id != ?1
         JOIN users o ON o.id = op.user_id
         LEFT JOIN direct_messages lm ON lm.rowid = (
             SELECT m.rowid FROM direct_messages m
             WHERE m.conversation_id = c.id
             ORDER BY m.created_at DESC, m.rowid DESC
             LIMIT 1)
         WHERE (SELECT COUNT(*) FROM conversation_participants p WHERE p.conversation_id = c.id) = 2
           AND (?2 IS NULL OR c.id = ?2)
         ORDER BY c.updated_at DESC, c.rowid DESC",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![user_id, conversation_id], |row| {
            Ok(ThreadSummaryRow {
                id: row.get(0)?,
                updated_at: row.get(1)?,
                other_id: row.get(2)?,
                other_username: row.get(3)?,
                unread_count: row.get(4)?,
                last_sender_id: row.get(5)?,
                last_body: row.get(6)?,
                last_created_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_conversation_by_pair_key(conn: &Connection, key: &str) -> Result<Option<ConversationRow>> {
    conn.query_row(
        "SELECT id, created_at, updated_at FROM conversations WHERE pair_key = ?1",
        [key],
        conversation_from_row,
    )
    .optional()
}

fn query_direct_messages(
    conn: &Connection,
    conversation_id: &str,
    window: &FeedWindow,
) -> Result<Vec<DirectMessageRow>> {
    // Latest `limit` rows, handed back in ascending order
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender_id, sender_username, body, is_read, created_at
         FROM (
             SELECT m.rowid AS seq, m.id, m.conversation_id, m.sender_id,
                    COALESCE(u.username, 'unknown') AS sender_username,
                    m.body, m.is_read, m.created_at
             FROM direct_messages m
             LEFT JOIN users u ON u.id = m.sender_id
             WHERE m.conversation_id = ?1 AND (?2 IS NULL OR m.created_at < ?2)
             ORDER BY m.created_at DESC, m.rowid DESC
             LIMIT ?3
         )
         ORDER BY created_at ASC, seq ASC",
    )?;

    let rows = stmt
        .query_map(
            rusqlite::params![conversation_id, window.before, window.effective_limit()],
            direct_message_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

fn direct_message_from_row(row: &Row<'_>) -> rusqlite::Result<DirectMessageRow> {
    Ok(DirectMessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_username: row.get(3)?,
        body: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}
