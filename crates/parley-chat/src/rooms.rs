use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use parley_db::models::ChatMessageRow;
use parley_db::{ReactionKind, format_timestamp};
use parley_types::api::{ChatMessageResponse, ReactionGroup};
use parley_types::models::{Identity, Scope};

use crate::convert::{parse_id, parse_timestamp};
use crate::feed::group_reactions;
use crate::{ChatError, ChatResult, ChatService, Window, require_text};

impl ChatService {
    pub fn post_chat_message(
        &self,
        identity: &Identity,
        scope: Scope,
        text: &str,
    ) -> ChatResult<ChatMessageResponse> {
        self.require_scope(identity, scope)?;
        require_text(text)?;

        let id = Uuid::new_v4();
        let created_at = format_timestamp(Utc::now());
        let community_id = scope.community_id().map(|c| c.to_string());
        self.db.insert_chat_message(
            &id.to_string(),
            community_id.as_deref(),
            &identity.id.to_string(),
            text,
            &created_at,
        )?;
        debug!("{} posted chat message {} in {:?}", identity.username, id, scope);

        Ok(ChatMessageResponse {
            id,
            scope,
            author_id: identity.id,
            author_username: identity.username.clone(),
            text: text.to_string(),
            created_at: parse_timestamp(&created_at),
            reactions: vec![],
        })
    }

    /// Newest messages of one scope, oldest first.
    pub fn list_chat_messages(
        &self,
        identity: &Identity,
        scope: Scope,
        window: Window,
    ) -> ChatResult<Vec<ChatMessageResponse>> {
        self.require_scope(identity, scope)?;

        let community_id = scope.community_id().map(|c| c.to_string());
        let rows = self
            .db
            .get_chat_messages(community_id.as_deref(), &window.to_store())?;

        let message_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let reactions = self
            .db
            .get_reactions_for_messages(ReactionKind::Chat, &message_ids)?;
        let mut reactions = group_reactions(reactions, identity);

        Ok(rows
            .into_iter()
            .map(|row| {
                let groups = reactions.remove(&row.id).unwrap_or_default();
                chat_message_view(row, groups)
            })
            .collect())
    }

    /// Delete the caller's own message. A message from another scope is
    /// treated as missing.
    pub fn delete_chat_message(&self, identity: &Identity, scope: Scope, message: Uuid) -> ChatResult<()> {
        self.require_scope(identity, scope)?;

        let row = self
            .find_chat_message(message)?
            .filter(|row| row_scope(row) == scope)
            .ok_or_else(|| ChatError::NotFound("Message not found".into()))?;

        if row.user_id != identity.id.to_string() {
            return Err(ChatError::Forbidden(
                "You can only delete your own messages.".into(),
            ));
        }

        self.db.delete_chat_message(&row.id)?;
        debug!("{} deleted chat message {}", identity.username, row.id);
        Ok(())
    }

    pub(crate) fn find_chat_message(&self, message: Uuid) -> ChatResult<Option<ChatMessageRow>> {
        Ok(self.db.get_chat_message(&message.to_string())?)
    }
}

pub(crate) fn row_scope(row: &ChatMessageRow) -> Scope {
    Scope::from_community_id(
        row.community_id
            .as_deref()
            .map(|id| parse_id(id, "community_id")),
    )
}

fn chat_message_view(row: ChatMessageRow, reactions: Vec<ReactionGroup>) -> ChatMessageResponse {
    ChatMessageResponse {
        id: parse_id(&row.id, "message id"),
        scope: row_scope(&row),
        author_id: parse_id(&row.user_id, "author_id"),
        author_username: row.username,
        text: row.body,
        created_at: parse_timestamp(&row.created_at),
        reactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service, user};

    #[test]
    fn global_room_is_open_and_partitioned() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let community = chat.create_community(&alice, "Study Group").unwrap().id;

        chat.post_chat_message(&bob, Scope::Global, "hello everyone").unwrap();
        chat.post_chat_message(&alice, Scope::Channel(community), "hello group").unwrap();

        let global = chat.list_chat_messages(&alice, Scope::Global, Window::default()).unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].text, "hello everyone");
        assert_eq!(global[0].scope, Scope::Global);

        let channel = chat
            .list_chat_messages(&alice, Scope::Channel(community), Window::default())
            .unwrap();
        assert_eq!(channel.len(), 1);
        assert_eq!(channel[0].scope, Scope::Channel(community));
    }

    #[test]
    fn non_members_are_forbidden_in_channels() {
        let chat = service();
        let alice = user(&chat, "alice");
        let eve = user(&chat, "eve");
        let community = chat.create_community(&alice, "Study Group").unwrap().id;
        let message = chat
            .post_chat_message(&alice, Scope::Channel(community), "members only")
            .unwrap()
            .id;
        let scope = Scope::Channel(community);

        assert!(matches!(
            chat.post_chat_message(&eve, scope, "hi"),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.list_chat_messages(&eve, scope, Window::default()),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.delete_chat_message(&eve, scope, message),
            Err(ChatError::Forbidden(_))
        ));
    }

    #[test]
    fn delete_checks_scope_and_author() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let community = chat.create_community(&alice, "Study Group").unwrap().id;
        let in_channel = chat
            .post_chat_message(&alice, Scope::Channel(community), "group note")
            .unwrap()
            .id;
        let in_global = chat.post_chat_message(&alice, Scope::Global, "hi all").unwrap().id;

        // Reaching a channel message through the global room
        assert!(matches!(
            chat.delete_chat_message(&alice, Scope::Global, in_channel),
            Err(ChatError::NotFound(_))
        ));
        assert!(matches!(
            chat.delete_chat_message(&bob, Scope::Global, in_global),
            Err(ChatError::Forbidden(_))
        ));

        chat.delete_chat_message(&alice, Scope::Global, in_global).unwrap();
        chat.delete_chat_message(&alice, Scope::Channel(community), in_channel).unwrap();
        assert!(chat.list_chat_messages(&alice, Scope::Global, Window::default()).unwrap().is_empty());
    }

    #[test]
    fn blank_chat_text_rejected() {
        let chat = service();
        let alice = user(&chat, "alice");
        assert!(matches!(
            chat.post_chat_message(&alice, Scope::Global, ""),
            Err(ChatError::InvalidRequest(_))
        ));
    }
}
