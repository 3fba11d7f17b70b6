use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        -- pair_key is the sorted participant pair of a 1:1 thread
        CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            pair_key    TEXT UNIQUE,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversation_participants (
            conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            user_id         TEXT NOT NULL REFERENCES users(id),
            PRIMARY KEY (conversation_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_user
            ON conversation_participants(user_id);

        CREATE TABLE IF NOT EXISTS direct_messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            body            TEXT NOT NULL,
            is_read         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_direct_messages_conversation
            ON direct_messages(conversation_id, created_at);

        CREATE TABLE IF NOT EXISTS dm_reactions (
            id          TEXT PRIMARY KEY,
            message_id  TEXT NOT NULL REFERENCES direct_messages(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            emoji       TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE(message_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS communities (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            created_by  TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS community_memberships (
            community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
            user_id      TEXT NOT NULL REFERENCES users(id),
            role         TEXT NOT NULL CHECK (role IN ('admin', 'member')),
            added_by     TEXT REFERENCES users(id),
            created_at   TEXT NOT NULL,
            PRIMARY KEY (community_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_memberships_user
            ON community_memberships(user_id);

        -- NULL community_id is the global room
        CREATE TABLE IF NOT EXISTS chat_messages (
            id           TEXT PRIMARY KEY,
            community_id TEXT REFERENCES communities(id) ON DELETE CASCADE,
            user_id      TEXT NOT NULL REFERENCES users(id),
            body         TEXT NOT NULL,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chat_messages_scope
            ON chat_messages(community_id, created_at);

        CREATE TABLE IF NOT EXISTS chat_reactions (
            id          TEXT PRIMARY KEY,
            message_id  TEXT NOT NULL REFERENCES chat_messages(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            emoji       TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE(message_id, user_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
