/// Database row types. These map directly to SQLite rows.
/// Distinct from parley-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One entry of a user's thread list, with the other participant and the
/// latest message already joined in.
pub struct ThreadSummaryRow {
    pub id: String,
    pub updated_at: String,
    pub other_id: String,
    pub other_username: String,
    pub unread_count: u32,
    pub last_sender_id: Option<String>,
    pub last_body: Option<String>,
    pub last_created_at: Option<String>,
}

pub struct DirectMessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

pub struct CommunityRow {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: String,
}

pub struct MembershipRow {
    pub community_id: String,
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub added_by: Option<String>,
    pub created_at: String,
}

pub struct ChatMessageRow {
    pub id: String,
    pub community_id: Option<String>,
    pub user_id: String,
    pub username: String,
    pub body: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub message_id: String,
    pub user_id: String,
    pub username: String,
    pub emoji: String,
}
