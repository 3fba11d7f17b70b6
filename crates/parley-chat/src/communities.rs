use tracing::info;
use uuid::Uuid;

use parley_db::models::MembershipRow;
use parley_types::api::{CommunityResponse, MemberResponse, UserSummary};
use parley_types::models::{Identity, Role};

use crate::convert::{parse_id, parse_timestamp};
use crate::{ChatError, ChatResult, ChatService};

impl ChatService {
    /// Create a community with the caller as its first admin.
    pub fn create_community(&self, identity: &Identity, name: &str) -> ChatResult<CommunityResponse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidRequest("name is required".into()));
        }

        let id = Uuid::new_v4();
        let row = self
            .db
            .create_community(&id.to_string(), name, &identity.id.to_string())?;
        info!("{} created community '{}' ({})", identity.username, name, id);

        Ok(CommunityResponse {
            id,
            name: row.name,
            created_by: identity.id,
            role: Role::Admin,
            created_at: parse_timestamp(&row.created_at),
        })
    }

    /// Communities the caller belongs to, by name.
    pub fn list_communities(&self, identity: &Identity) -> ChatResult<Vec<CommunityResponse>> {
        let rows = self.db.list_communities_for_user(&identity.id.to_string())?;
        Ok(rows
            .into_iter()
            .map(|(row, role)| CommunityResponse {
                id: parse_id(&row.id, "community id"),
                name: row.name,
                created_by: parse_id(&row.created_by, "created_by"),
                role: Role::parse(&role).unwrap_or(Role::Member),
                created_at: parse_timestamp(&row.created_at),
            })
            .collect())
    }

    pub fn list_members(&self, identity: &Identity, community: Uuid) -> ChatResult<Vec<MemberResponse>> {
        self.require_member(identity, community)?;
        let rows = self.db.list_members(&community.to_string())?;
        Ok(rows.into_iter().map(member_view).collect())
    }

    /// Admin-only. Adding someone who is already a member is rejected.
    pub fn add_member(
        &self,
        identity: &Identity,
        community: Uuid,
        username: &str,
    ) -> ChatResult<MemberResponse> {
        self.require_admin(identity, community)?;
        let user = self.resolve_username(username)?;

        let community_id = community.to_string();
        let added = self.db.add_member(
            &community_id,
            &user.id,
            Role::Member.as_str(),
            &identity.id.to_string(),
        )?;
        if !added {
            return Err(ChatError::InvalidRequest("User is already a member".into()));
        }
        info!("{} added {} to community {}", identity.username, user.username, community);

        let row = self
            .db
            .get_membership(&community_id, &user.id)?
            .ok_or_else(|| anyhow::anyhow!("Membership {}/{} missing after insert", community_id, user.id))?;
        Ok(member_view(row))
    }
}

fn member_view(row: MembershipRow) -> MemberResponse {
    MemberResponse {
        user: UserSummary {
            id: parse_id(&row.user_id, "user id"),
            username: row.username,
        },
        role: Role::parse(&row.role).unwrap_or(Role::Member),
        added_by: row.added_by.as_deref().map(|id| parse_id(id, "added_by")),
        joined_at: parse_timestamp(&row.created_at),
    }
}
