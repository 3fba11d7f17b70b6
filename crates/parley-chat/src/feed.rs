use std::collections::HashMap;

use chrono::{DateTime, Utc};

use parley_db::models::ReactionRow;
use parley_db::queries::DEFAULT_FEED_LIMIT;
use parley_db::{FeedWindow, format_timestamp};
use parley_types::api::{ReactionGroup, ReactionUser};
use parley_types::models::Identity;

use crate::convert::parse_id;

/// Which slice of a feed to read: the newest `limit` messages, optionally
/// only those older than `before`. Each read re-queries the store, so the
/// same window can be read again at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub before: Option<DateTime<Utc>>,
}

impl Window {
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            before: None,
        }
    }

    pub fn before(mut self, cursor: DateTime<Utc>) -> Self {
        self.before = Some(cursor);
        self
    }

    pub(crate) fn to_store(self) -> FeedWindow {
        let window = FeedWindow::latest(self.limit);
        match self.before {
            Some(cursor) => window.before(format_timestamp(cursor)),
            None => window,
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::latest(DEFAULT_FEED_LIMIT)
    }
}

/// Group reaction rows by message, then by emoji in order of first use.
pub(crate) fn group_reactions(
    rows: Vec<ReactionRow>,
    viewer: &Identity,
) -> HashMap<String, Vec<ReactionGroup>> {
    let mut grouped: HashMap<String, Vec<ReactionGroup>> = HashMap::new();

    for row in rows {
        let user_id = parse_id(&row.user_id, "reaction user_id");
        let user = ReactionUser {
            id: user_id,
            username: row.username,
            is_me: user_id == viewer.id,
        };

        let groups = grouped.entry(row.message_id).or_default();
        match groups.iter_mut().find(|g| g.emoji == row.emoji) {
            Some(group) => {
                group.count += 1;
                group.users.push(user);
            }
            None => groups.push(ReactionGroup {
                emoji: row.emoji,
                count: 1,
                users: vec![user],
            }),
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn row(message: &str, user: Uuid, name: &str, emoji: &str) -> ReactionRow {
        ReactionRow {
            message_id: message.to_string(),
            user_id: user.to_string(),
            username: name.to_string(),
            emoji: emoji.to_string(),
        }
    }

    #[test]
    fn groups_by_message_then_emoji() {
        let me = Identity::new(Uuid::new_v4(), "me");
        let other = Uuid::new_v4();
        let third = Uuid::new_v4();

        let grouped = group_reactions(
            vec![
                row("m1", other, "other", "❤️"),
                row("m1", me.id, "me", "👍"),
                row("m1", third, "third", "❤️"),
                row("m2", other, "other", "🔥"),
            ],
            &me,
        );

        let m1 = &grouped["m1"];
        assert_eq!(m1.len(), 2);
        assert_eq!(m1[0].emoji, "❤️");
        assert_eq!(m1[0].count, 2);
        assert!(m1[0].users.iter().all(|u| !u.is_me));
        assert_eq!(m1[1].emoji, "👍");
        assert!(m1[1].users[0].is_me);

        assert_eq!(grouped["m2"][0].count, 1);
    }

    #[test]
    fn window_cursor_uses_storage_format() {
        let cursor = "2026-01-01T00:00:05Z".parse::<DateTime<Utc>>().unwrap();
        let store = Window::latest(20).before(cursor).to_store();
        assert_eq!(store.limit, 20);
        assert_eq!(store.before.as_deref(), Some("2026-01-01T00:00:05.000000Z"));
    }
}
