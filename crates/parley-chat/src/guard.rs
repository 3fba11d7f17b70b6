use uuid::Uuid;

use parley_types::models::{Identity, Role, Scope};

use crate::{ChatError, ChatResult, ChatService};

/// What an identity must hold before touching a thread or channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Participant of a 1:1 thread.
    ParticipantOf(Uuid),
    /// Member of a community, any role.
    MemberOf(Uuid),
    /// Admin of a community.
    AdminOf(Uuid),
}

impl Capability {
    /// Capability needed to read or write in a chat scope. The global room
    /// is open to every authenticated identity.
    pub fn for_scope(scope: Scope) -> Option<Self> {
        match scope {
            Scope::Global => None,
            Scope::Channel(community) => Some(Self::MemberOf(community)),
        }
    }
}

impl ChatService {
    /// Check `capability` for `identity`. A thread or community that does
    /// not exist is `NotFound`; an existing one the identity may not use is
    /// `Forbidden`.
    pub fn require(&self, identity: &Identity, capability: Capability) -> ChatResult<()> {
        match capability {
            Capability::ParticipantOf(thread) => {
                let thread_id = thread.to_string();
                if self.db.get_conversation(&thread_id)?.is_none() {
                    return Err(ChatError::NotFound("Thread not found".into()));
                }
                if !self.db.is_participant(&thread_id, &identity.id.to_string())? {
                    return Err(ChatError::Forbidden(
                        "You are not a participant in this thread.".into(),
                    ));
                }
                Ok(())
            }
            Capability::MemberOf(community) => match self.community_role(identity, community)? {
                Some(_) => Ok(()),
                None => Err(ChatError::Forbidden(
                    "You are not a member of this community.".into(),
                )),
            },
            Capability::AdminOf(community) => match self.community_role(identity, community)? {
                Some(Role::Admin) => Ok(()),
                _ => Err(ChatError::Forbidden(
                    "Only community admins can do this.".into(),
                )),
            },
        }
    }

    pub fn require_scope(&self, identity: &Identity, scope: Scope) -> ChatResult<()> {
        match Capability::for_scope(scope) {
            Some(capability) => self.require(identity, capability),
            None => Ok(()),
        }
    }

    pub fn require_member(&self, identity: &Identity, community: Uuid) -> ChatResult<()> {
        self.require(identity, Capability::MemberOf(community))
    }

    pub fn require_admin(&self, identity: &Identity, community: Uuid) -> ChatResult<()> {
        self.require(identity, Capability::AdminOf(community))
    }

    fn community_role(&self, identity: &Identity, community: Uuid) -> ChatResult<Option<Role>> {
        let community_id = community.to_string();
        if self.db.get_community(&community_id)?.is_none() {
            return Err(ChatError::NotFound("Community not found".into()));
        }
        let role = self
            .db
            .membership_role(&community_id, &identity.id.to_string())?
            .and_then(|r| Role::parse(&r));
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service, user};

    #[test]
    fn global_scope_needs_no_capability() {
        assert_eq!(Capability::for_scope(Scope::Global), None);
        let id = Uuid::new_v4();
        assert_eq!(
            Capability::for_scope(Scope::Channel(id)),
            Some(Capability::MemberOf(id))
        );

        let chat = service();
        let alice = user(&chat, "alice");
        assert!(chat.require_scope(&alice, Scope::Global).is_ok());
    }

    #[test]
    fn thread_participants_only() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let eve = user(&chat, "eve");
        let thread = chat.get_or_create_thread(&alice, bob.id).unwrap().thread.id;

        assert!(chat.require(&alice, Capability::ParticipantOf(thread)).is_ok());
        assert!(chat.require(&bob, Capability::ParticipantOf(thread)).is_ok());
        assert!(matches!(
            chat.require(&eve, Capability::ParticipantOf(thread)),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.require(&alice, Capability::ParticipantOf(Uuid::new_v4())),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn member_and_admin_checks() {
        let chat = service();
        let alice = user(&chat, "alice");
        let bob = user(&chat, "bob");
        let eve = user(&chat, "eve");
        let community = chat.create_community(&alice, "Study Group").unwrap().id;
        chat.add_member(&alice, community, "bob").unwrap();

        assert!(chat.require_admin(&alice, community).is_ok());
        assert!(chat.require_member(&bob, community).is_ok());
        assert!(matches!(
            chat.require_admin(&bob, community),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.require_member(&eve, community),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.require_scope(&eve, Scope::Channel(community)),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            chat.require_member(&alice, Uuid::new_v4()),
            Err(ChatError::NotFound(_))
        ));
    }
}
