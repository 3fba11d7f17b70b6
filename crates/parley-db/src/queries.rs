mod chat;
mod communities;
mod reactions;
mod threads;
mod users;

pub use reactions::ReactionKind;
pub use threads::pair_key;

use anyhow::Result;

pub const DEFAULT_FEED_LIMIT: u32 = 50;
pub const MAX_FEED_LIMIT: u32 = 200;

/// Bounds of one feed read: the latest `limit` messages, optionally only
/// those created strictly before `before` (a storage timestamp).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedWindow {
    pub limit: u32,
    pub before: Option<String>,
}

impl FeedWindow {
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            before: None,
        }
    }

    pub fn before(mut self, timestamp: impl Into<String>) -> Self {
        self.before = Some(timestamp.into());
        self
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_FEED_LIMIT)
    }
}

impl Default for FeedWindow {
    fn default() -> Self {
        Self::latest(DEFAULT_FEED_LIMIT)
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use uuid::Uuid;

    use crate::Database;

    pub fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, "hash").unwrap();
        id
    }
}
