use tracing::{debug, info};
use uuid::Uuid;

use parley_db::models::ThreadSummaryRow;
use parley_types::api::{LastMessage, ThreadResponse, UserSummary};
use parley_types::models::Identity;

use crate::convert::{parse_id, parse_timestamp};
use crate::{ChatError, ChatResult, ChatService};

/// Result of thread resolution: the thread as the caller sees it, and
/// whether this call created it.
#[derive(Debug, Clone)]
pub struct ResolvedThread {
    pub thread: ThreadResponse,
    pub created: bool,
}

impl ChatService {
    /// Find or create the unique 1:1 thread between `identity` and `other_id`.
    /// Argument order does not matter: (a, b) and (b, a) resolve to the same
    /// thread.
    pub fn get_or_create_thread(
        &self,
        identity: &Identity,
        other_id: Uuid,
    ) -> ChatResult<ResolvedThread> {
        if other_id == identity.id {
            return Err(ChatError::InvalidRequest("Cannot message yourself".into()));
        }

        let other = self
            .db
            .get_user_by_id(&other_id.to_string())?
            .ok_or_else(|| ChatError::NotFound("User not found".into()))?;

        let (row, created) = self.db.find_or_create_thread(
            &Uuid::new_v4().to_string(),
            &identity.id.to_string(),
            &other.id,
        )?;

        if created {
            info!("Thread {} created between {} and {}", row.id, identity.username, other.username);
        } else {
            debug!("Thread {} reused for {} and {}", row.id, identity.username, other.username);
        }

        // Existing threads come back with their latest message and unread count
        let summary = if created {
            None
        } else {
            self.db.get_thread_summary(&row.id, &identity.id.to_string())?
        };

        let thread = match summary {
            Some(summary) => self.thread_view(summary),
            None => ThreadResponse {
                id: parse_id(&row.id, "thread id"),
                other_user: UserSummary {
                    id: other_id,
                    username: other.username,
                },
                last_message: None,
                unread_count: 0,
                updated_at: parse_timestamp(&row.updated_at),
            },
        };

        Ok(ResolvedThread { thread, created })
    }

    /// Resolve `username` (case-insensitive) and open a thread with that user.
    pub fn open_thread_with(&self, identity: &Identity, username: &str) -> ChatResult<ResolvedThread> {
        let other = self.resolve_username(username)?;
        self.get_or_create_thread(identity, parse_id(&other.id, "user id"))
    }

    /// Every 1:1 thread of `identity`, most recently active first.
    pub fn list_threads(&self, identity: &Identity) -> ChatResult<Vec<ThreadResponse>> {
        let rows = self.db.list_threads_for_user(&identity.id.to_string())?;
        Ok(rows.into_iter().map(|row| self.thread_view(row)).collect())
    }

    fn thread_view(&self, row: ThreadSummaryRow) -> ThreadResponse {
        let last_message = match (row.last_sender_id, row.last_body, row.last_created_at) {
            (Some(sender), Some(body), Some(created_at)) => Some(LastMessage {
                sender_id: parse_id(&sender, "sender_id"),
                text: self.unseal(&body),
                created_at: parse_timestamp(&created_at),
            }),
            _ => None,
        };

        ThreadResponse {
            id: parse_id(&row.id, "thread id"),
            other_user: UserSummary {
                id: parse_id(&row.other_id, "user id"),
                username: row.other_username,
            },
            last_message,
            unread_count: row.unread_count,
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}
