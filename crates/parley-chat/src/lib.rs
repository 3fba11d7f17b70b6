//! Messaging core: 1:1 threads, community channels, the global room and
//! reactions, over a [`Database`] and a [`TextCodec`] for message bodies.
//!
//! Every operation takes the caller's [`Identity`](parley_types::models::Identity)
//! as already authenticated. Operations are synchronous; async callers run
//! them on a blocking thread.

pub mod communities;
mod convert;
pub mod direct;
pub mod error;
pub mod feed;
pub mod guard;
pub mod reactions;
pub mod rooms;
pub mod threads;
pub mod users;

use std::sync::Arc;

use tracing::warn;

use parley_crypto::TextCodec;
use parley_db::Database;

pub use error::{ChatError, ChatResult};
pub use feed::Window;
pub use guard::Capability;
pub use reactions::MessageRef;
pub use threads::ResolvedThread;

#[derive(Clone)]
pub struct ChatService {
    db: Arc<Database>,
    codec: Arc<dyn TextCodec>,
}

impl ChatService {
    pub fn new(db: Arc<Database>, codec: Arc<dyn TextCodec>) -> Self {
        Self { db, codec }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Encode a body for storage. A codec failure stores the plaintext.
    fn seal(&self, text: &str) -> String {
        match self.codec.encrypt(text) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!("Message encryption failed, storing plaintext: {}", e);
                text.to_string()
            }
        }
    }

    /// Decode a stored body. A codec failure returns the stored text unchanged.
    fn unseal(&self, stored: &str) -> String {
        match self.codec.decrypt(stored) {
            Ok(text) => text,
            Err(e) => {
                warn!("Message decryption failed, returning stored text: {}", e);
                stored.to_string()
            }
        }
    }
}

/// Rejects bodies that are empty after trimming.
fn require_text(text: &str) -> ChatResult<()> {
    if text.trim().is_empty() {
        return Err(ChatError::InvalidRequest("text is required".into()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use uuid::Uuid;

    use parley_crypto::{PlainCodec, TextCodec};
    use parley_db::Database;
    use parley_types::models::Identity;

    use crate::ChatService;

    pub fn service() -> ChatService {
        service_with(Arc::new(PlainCodec))
    }

    pub fn service_with(codec: Arc<dyn TextCodec>) -> ChatService {
        let db = Database::open_in_memory().unwrap();
        ChatService::new(Arc::new(db), codec)
    }

    pub fn user(chat: &ChatService, username: &str) -> Identity {
        let id = Uuid::new_v4();
        chat.db().create_user(&id.to_string(), username, "hash").unwrap();
        Identity::new(id, username)
    }
}
