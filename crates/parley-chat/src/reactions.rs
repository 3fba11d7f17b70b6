use tracing::debug;
use uuid::Uuid;

use parley_db::ReactionKind;
use parley_types::api::{ReactionCleared, ReactionSet};
use parley_types::models::{Identity, Scope};

use crate::convert::parse_id;
use crate::rooms::row_scope;
use crate::{Capability, ChatError, ChatResult, ChatService};

/// Address of a message that can carry reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRef {
    /// A direct message in a 1:1 thread.
    Direct(Uuid),
    /// A chat message, addressed through the scope the caller reached it in.
    Chat { scope: Scope, id: Uuid },
}

impl ChatService {
    /// Set the caller's reaction on a message, replacing any previous one.
    pub fn set_reaction(
        &self,
        identity: &Identity,
        message: MessageRef,
        emoji: &str,
    ) -> ChatResult<ReactionSet> {
        let (kind, message_id) = self.authorize_reaction(identity, message)?;
        let emoji = require_emoji(emoji)?;

        self.db.replace_reaction(
            kind,
            &Uuid::new_v4().to_string(),
            &message_id,
            &identity.id.to_string(),
            emoji,
        )?;
        debug!("{} reacted {} to {}", identity.username, emoji, message_id);

        Ok(ReactionSet {
            emoji: emoji.to_string(),
            created: true,
        })
    }

    /// Remove the caller's `emoji` reaction. Removing a reaction that is not
    /// there reports `deleted: false`.
    pub fn clear_reaction(
        &self,
        identity: &Identity,
        message: MessageRef,
        emoji: &str,
    ) -> ChatResult<ReactionCleared> {
        let (kind, message_id) = self.authorize_reaction(identity, message)?;
        let emoji = require_emoji(emoji)?;

        let deleted = self
            .db
            .delete_reaction(kind, &message_id, &identity.id.to_string(), emoji)?;

        Ok(ReactionCleared { deleted })
    }

    /// Resolve the message and check the caller may react to it.
    fn authorize_reaction(
        &self,
        identity: &Identity,
        message: MessageRef,
    ) -> ChatResult<(ReactionKind, String)> {
        match message {
            MessageRef::Direct(id) => {
                let row = self
                    .db
                    .get_direct_message(&id.to_string())?
                    .ok_or_else(|| ChatError::NotFound("Message not found".into()))?;
                let thread = parse_id(&row.conversation_id, "thread id");
                self.require(identity, Capability::ParticipantOf(thread))?;
                Ok((ReactionKind::Direct, row.id))
            }
            MessageRef::Chat { scope, id } => {
                let row = self
                    .find_chat_message(id)?
                    .ok_or_else(|| ChatError::NotFound("Message not found".into()))?;

                match (scope, row_scope(&row)) {
                    (Scope::Global, Scope::Channel(_)) => {
                        return Err(ChatError::Forbidden(
                            "This endpoint is for global chat only.".into(),
                        ));
                    }
                    (requested, actual) if requested != actual => {
                        return Err(ChatError::NotFound("Message not found".into()));
                    }
                    _ => {}
                }

                // Membership is checked only once the message is known to be in the channel
                if let Scope::Channel(community) = scope {
                    self.require_member(identity, community)?;
                }
                Ok((ReactionKind::Chat, row.id))
            }
        }
    }
}

fn require_emoji(emoji: &str) -> ChatResult<&str> {
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(ChatError::InvalidRequest("emoji is required".into()));
    }
    Ok(emoji)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Window;
    use crate::test_support::{service, user};

    #[test]
    fn new_emoji_replaces_old() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;
        let message = chat.send_direct_message(&alice, thread, "hi").unwrap().id;

        chat.set_reaction(&bob, MessageRef::Direct(message), "👍").unwrap();
        let set = chat.set_reaction(&bob, MessageRef::Direct(message), "🔥").unwrap();
        assert_eq!(set, ReactionSet { emoji: "🔥".into(), created: true });

        let rows = chat
            .db()
            .get_reactions_for_messages(ReactionKind::Direct, &[message.to_string()])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].emoji, "🔥");
        assert_eq!(rows[0].user_id, bob.id.to_string());
    }

    #[test]
    fn clearing_absent_reaction_is_not_an_error() {
        let chat = service();
        let alice = user(&chat, "alice");
        let message = chat.post_chat_message(&alice, Scope::Global, "hi").unwrap().id;
        let target = MessageRef::Chat { scope: Scope::Global, id: message };

        let cleared = chat.clear_reaction(&alice, target, "👍").unwrap();
        assert_eq!(cleared, ReactionCleared { deleted: false });

        chat.set_reaction(&alice, target, "👍").unwrap();
        assert!(chat.clear_reaction(&alice, target, "👍").unwrap().deleted);
        assert!(!chat.clear_reaction(&alice, target, "👍").unwrap().deleted);
    }

    #[test]
    fn empty_emoji_rejected() {
        let chat = service();
        let alice = user(&chat, "alice");
        let message = chat.post_chat_message(&alice, Scope::Global, "hi").unwrap().id;
        let target = MessageRef::Chat { scope: Scope::Global, id: message };

        assert!(matches!(
            chat.set_reaction(&alice, target, "  "),
            Err(ChatError::InvalidRequest(_))
        ));
        assert!(matches!(
            chat.clear_reaction(&alice, target, ""),
            Err(ChatError::InvalidRequest(_))
        ));
    }

    #[test]
    fn reaction_access_follows_message_scope() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let eve = user(&chat, "eve");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;
        let direct = chat.send_direct_message(&alice, thread, "private").unwrap().id;
        let community = chat.create_community(&alice, "Study Group").unwrap().id;
        let other_community = chat.create_community(&alice, "Other").unwrap().id;
        let in_channel = chat
            .post_chat_message(&alice, Scope::Channel(community), "group")
            .unwrap()
            .id;

        assert!(matches!(
            chat.set_reaction(&eve, MessageRef::Direct(direct), "👀"),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.set_reaction(&eve, MessageRef::Chat { scope: Scope::Channel(community), id: in_channel }, "👀"),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.set_reaction(&alice, MessageRef::Chat { scope: Scope::Global, id: in_channel }, "👀"),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.set_reaction(&alice, MessageRef::Chat { scope: Scope::Channel(other_community), id: in_channel }, "👀"),
            Err(ChatError::NotFound(_))
        ));
        assert!(matches!(
            chat.set_reaction(&alice, MessageRef::Direct(Uuid::new_v4()), "👀"),
            Err(ChatError::NotFound(_))
        ));

        chat.set_reaction(&alice, MessageRef::Chat { scope: Scope::Channel(community), id: in_channel }, "✅")
            .unwrap();
        let listed = chat
            .list_chat_messages(&alice, Scope::Channel(community), Window::default())
            .unwrap();
        assert_eq!(listed[0].reactions[0].emoji, "✅");
        assert!(listed[0].reactions[0].users[0].is_me);
    }

    #[test]
    fn missing_channel_message_is_not_found_before_membership() {
        let chat = service();
        let alice = user(&chat, "alice");
        let eve = user(&chat, "eve");
        let community = chat.create_community(&alice, "Study Group").unwrap().id;
        let global = chat.post_chat_message(&alice, Scope::Global, "hi all").unwrap().id;
        let channel = Scope::Channel(community);

        assert!(matches!(
            chat.set_reaction(&eve, MessageRef::Chat { scope: channel, id: Uuid::new_v4() }, "👀"),
            Err(ChatError::NotFound(_))
        ));
        assert!(matches!(
            chat.clear_reaction(&eve, MessageRef::Chat { scope: channel, id: global }, "👀"),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn alice_and_bob_scenario() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");

        let thread = chat.open_thread_with(&alice, "bob").unwrap().thread.id;
        let hi = chat.send_direct_message(&alice, thread, "hi").unwrap().id;
        let there = chat.send_direct_message(&alice, thread, "there").unwrap().id;

        let seen = chat.list_direct_messages(&bob, thread, Window::default()).unwrap();
        let texts: Vec<&str> = seen.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "there"]);
        assert!(seen.iter().all(|m| m.is_read));

        chat.set_reaction(&bob, MessageRef::Direct(there), "❤️").unwrap();
        let cleared = chat.clear_reaction(&alice, MessageRef::Direct(hi), "👍").unwrap();
        assert!(!cleared.deleted);

        let seen = chat.list_direct_messages(&alice, thread, Window::default()).unwrap();
        assert!(seen[0].reactions.is_empty());
        let heart = &seen[1].reactions[0];
        assert_eq!(heart.emoji, "❤️");
        assert_eq!(heart.count, 1);
        assert_eq!(heart.users[0].username, "bob");
        assert!(!heart.users[0].is_me);
    }
}
