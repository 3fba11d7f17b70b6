use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::Claims;

/// The authenticated caller of an operation. Supplied by the auth layer and
/// trusted as-is by everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

impl Identity {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
        }
    }
}

/// Partition a chat message lives in. A message is either in the global room
/// or in exactly one community channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "community_id", rename_all = "snake_case")]
pub enum Scope {
    Global,
    Channel(Uuid),
}

impl Scope {
    pub fn community_id(&self) -> Option<Uuid> {
        match self {
            Self::Global => None,
            Self::Channel(id) => Some(*id),
        }
    }

    pub fn from_community_id(community_id: Option<Uuid>) -> Self {
        match community_id {
            Some(id) => Self::Channel(id),
            None => Self::Global,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}
