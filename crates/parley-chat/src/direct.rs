use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use parley_db::models::DirectMessageRow;
use parley_db::{ReactionKind, format_timestamp};
use parley_types::api::{DirectMessageResponse, ReactionGroup};
use parley_types::models::Identity;

use crate::convert::{parse_id, parse_timestamp};
use crate::feed::group_reactions;
use crate::{Capability, ChatError, ChatResult, ChatService, Window, require_text};

impl ChatService {
    pub fn send_direct_message(
        &self,
        identity: &Identity,
        thread: Uuid,
        text: &str,
    ) -> ChatResult<DirectMessageResponse> {
        self.require(identity, Capability::ParticipantOf(thread))?;
        require_text(text)?;

        let id = Uuid::new_v4();
        let created_at = format_timestamp(Utc::now());
        self.db.insert_direct_message(
            &id.to_string(),
            &thread.to_string(),
            &identity.id.to_string(),
            &self.seal(text),
            &created_at,
        )?;
        debug!("{} sent direct message {} in thread {}", identity.username, id, thread);

        Ok(DirectMessageResponse {
            id,
            thread_id: thread,
            sender_id: identity.id,
            sender_username: identity.username.clone(),
            text: text.to_string(),
            is_read: false,
            created_at: parse_timestamp(&created_at),
            reactions: vec![],
        })
    }

    /// Newest messages of the thread, oldest first. Reading marks every
    /// unread message from the other participant as read, so a second call
    /// sees them already read.
    pub fn list_direct_messages(
        &self,
        identity: &Identity,
        thread: Uuid,
        window: Window,
    ) -> ChatResult<Vec<DirectMessageResponse>> {
        self.require(identity, Capability::ParticipantOf(thread))?;

        let rows = self.db.read_direct_messages(
            &thread.to_string(),
            &identity.id.to_string(),
            &window.to_store(),
        )?;

        let message_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let reactions = self
            .db
            .get_reactions_for_messages(ReactionKind::Direct, &message_ids)?;
        let mut reactions = group_reactions(reactions, identity);

        Ok(rows
            .into_iter()
            .map(|row| {
                let groups = reactions.remove(&row.id).unwrap_or_default();
                self.direct_message_view(row, groups)
            })
            .collect())
    }

    /// Only the sender may delete a message.
    pub fn delete_direct_message(&self, identity: &Identity, message: Uuid) -> ChatResult<()> {
        let row = self
            .db
            .get_direct_message(&message.to_string())?
            .ok_or_else(|| ChatError::NotFound("Message not found".into()))?;

        if row.sender_id != identity.id.to_string() {
            return Err(ChatError::Forbidden(
                "You can only delete your own messages.".into(),
            ));
        }

        self.db.delete_direct_message(&row.id)?;
        debug!("{} deleted direct message {}", identity.username, row.id);
        Ok(())
    }

    fn direct_message_view(
        &self,
        row: DirectMessageRow,
        reactions: Vec<ReactionGroup>,
    ) -> DirectMessageResponse {
        DirectMessageResponse {
            id: parse_id(&row.id, "message id"),
            thread_id: parse_id(&row.conversation_id, "thread id"),
            sender_id: parse_id(&row.sender_id, "sender_id"),
            sender_username: row.sender_username,
            text: self.unseal(&row.body),
            is_read: row.is_read,
            created_at: parse_timestamp(&row.created_at),
            reactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{service, service_with, user};
    use parley_crypto::AesGcmCodec;
    use parley_crypto::keys::generate_key;

    #[test]
    fn reading_marks_other_participants_messages_once() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;

        chat.send_direct_message(&alice, thread, "hi").unwrap();
        chat.send_direct_message(&alice, thread, "there").unwrap();
        chat.send_direct_message(&bob, thread, "yo").unwrap();

        // Alice reading does not mark her own messages
        let seen_by_alice = chat.list_direct_messages(&alice, thread, Window::default()).unwrap();
        let flags: Vec<bool> = seen_by_alice.iter().map(|m| m.is_read).collect();
        assert_eq!(flags, vec![false, false, true]);

        let first = chat.list_direct_messages(&bob, thread, Window::default()).unwrap();
        assert!(first.iter().all(|m| m.is_read));

        let second = chat.list_direct_messages(&bob, thread, Window::default()).unwrap();
        let first_flags: Vec<(Uuid, bool)> = first.iter().map(|m| (m.id, m.is_read)).collect();
        let second_flags: Vec<(Uuid, bool)> = second.iter().map(|m| (m.id, m.is_read)).collect();
        assert_eq!(first_flags, second_flags);
    }

    #[test]
    fn listing_is_bounded_and_oldest_first() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;

        for i in 0..8 {
            chat.send_direct_message(&alice, thread, &format!("m{}", i)).unwrap();
        }

        let page = chat.list_direct_messages(&bob, thread, Window::latest(5)).unwrap();
        let texts: Vec<&str> = page.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m3", "m4", "m5", "m6", "m7"]);
        assert!(page.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let cursor = page[0].created_at;
        let older = chat
            .list_direct_messages(&bob, thread, Window::latest(5).before(cursor))
            .unwrap();
        assert!(!older.is_empty() && older.len() <= 3);
        assert_eq!(older[0].text, "m0");
        assert!(older.iter().all(|m| m.created_at < cursor));
    }

    #[test]
    fn outsiders_cannot_read_or_write() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let eve = user(&chat, "eve");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;

        assert!(matches!(
            chat.send_direct_message(&eve, thread, "let me in"),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.list_direct_messages(&eve, thread, Window::default()),
            Err(ChatError::Forbidden(_))
        ));
    }

    #[test]
    fn blank_text_rejected() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;

        assert!(matches!(
            chat.send_direct_message(&alice, thread, "  \n"),
            Err(ChatError::InvalidRequest(_))
        ));
    }

    #[test]
    fn only_sender_deletes() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;
        let message = chat.send_direct_message(&alice, thread, "oops").unwrap().id;

        assert!(matches!(
            chat.delete_direct_message(&bob, message),
            Err(ChatError::Forbidden(_))
        ));
        chat.delete_direct_message(&alice, message).unwrap();
        assert!(matches!(
            chat.delete_direct_message(&alice, message),
            Err(ChatError::NotFound(_))
        ));
        assert!(chat.list_direct_messages(&alice, thread, Window::default()).unwrap().is_empty());
    }

    #[test]
    fn bodies_encrypted_at_rest() {
        let chat = service_with(Arc::new(AesGcmCodec::new(generate_key())));
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;
        let sent = chat.send_direct_message(&alice, thread, "top secret").unwrap();

        let stored = chat.db().get_direct_message(&sent.id.to_string()).unwrap().unwrap();
        assert_ne!(stored.body, "top secret");

        let listed = chat.list_direct_messages(&bob, thread, Window::default()).unwrap();
        assert_eq!(listed[0].text, "top secret");
    }

    #[test]
    fn undecryptable_body_returned_raw() {
        let chat = service_with(Arc::new(AesGcmCodec::new(generate_key())));
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;

        // Written before encryption was enabled
        chat.db()
            .insert_direct_message(
                &Uuid::new_v4().to_string(),
                &thread.to_string(),
                &alice.id.to_string(),
                "legacy plaintext",
                &format_timestamp(Utc::now()),
            )
            .unwrap();

        let listed = chat.list_direct_messages(&bob, thread, Window::default()).unwrap();
        assert_eq!(listed[0].text, "legacy plaintext");

        let threads = chat.list_threads(&bob).unwrap();
        assert_eq!(threads[0].last_message.as_ref().unwrap().text, "legacy plaintext");
    }
}
