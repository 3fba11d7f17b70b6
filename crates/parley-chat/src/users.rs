use parley_db::models::UserRow;
use parley_types::api::UserSummary;
use parley_types::models::Identity;

use crate::convert::parse_id;
use crate::{ChatError, ChatResult, ChatService};

const SEARCH_MIN_LEN: usize = 2;
const SEARCH_LIMIT: u32 = 10;

impl ChatService {
    /// Look up a user by username, ignoring case and surrounding whitespace.
    pub fn resolve_username(&self, username: &str) -> ChatResult<UserRow> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::InvalidRequest("username is required".into()));
        }
        self.db
            .get_user_by_username(username)?
            .ok_or_else(|| ChatError::NotFound("User not found".into()))
    }

    /// Users whose name contains `query`, excluding the caller. Queries
    /// shorter than two characters return nothing.
    pub fn search_users(&self, identity: &Identity, query: &str) -> ChatResult<Vec<UserSummary>> {
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_LEN {
            return Ok(vec![]);
        }

        let rows = self
            .db
            .search_users(query, &identity.id.to_string(), SEARCH_LIMIT)?;

        Ok(rows
            .into_iter()
            .map(|row| UserSummary {
                id: parse_id(&row.id, "user id"),
                username: row.username,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{service, user};

    #[test]
    fn short_queries_return_nothing() {
        let chat = service();
        let alice = user(&chat, "alice");
        user(&chat, "al");

        assert!(chat.search_users(&alice, "a").unwrap().is_empty());
        assert!(chat.search_users(&alice, "  a ").unwrap().is_empty());
    }

    #[test]
    fn search_is_capped_and_excludes_caller() {
        let chat = service();
        let me = user(&chat, "student0");
        for i in 1..=12 {
            user(&chat, &format!("student{}", i));
        }

        let found = chat.search_users(&me, "STUDENT").unwrap();
        assert_eq!(found.len(), 10);
        assert!(found.iter().all(|u| u.id != me.id));
    }
}
