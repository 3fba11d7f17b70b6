use anyhow::Result;
use rusqlite::{Row, TransactionBehavior};

use super::OptionalExt;
use crate::models::{CommunityRow, MembershipRow};
use crate::{Database, now_timestamp};

impl Database {
    // -- Communities --

    /// Creates the community and makes `creator_id` its first admin.
    pub fn create_community(&self, id: &str, name: &str, creator_id: &str) -> Result<CommunityRow> {
        self.with_conn_mut(|conn| {
            let now = now_timestamp();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO communities (id, name, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, creator_id, now],
            )?;
            tx.execute(
                "INSERT INTO community_memberships (community_id, user_id, role, added_by, created_at)
                 VALUES (?1, ?2, 'admin', ?2, ?3)",
                rusqlite::params![id, creator_id, now],
            )?;
            tx.commit()?;

            Ok(CommunityRow {
                id: id.to_string(),
                name: name.to_string(),
                created_by: creator_id.to_string(),
                created_at: now,
            })
        })
    }

    pub fn get_community(&self, id: &str) -> Result<Option<CommunityRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, created_by, created_at FROM communities WHERE id = ?1",
                [id],
                community_from_row,
            )
            .optional()
        })
    }

    /// Communities `user_id` belongs to, by name, paired with the user's role.
    pub fn list_communities_for_user(&self, user_id: &str) -> Result<Vec<(CommunityRow, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.name, c.created_by, c.created_at, m.role
                 FROM communities c
                 JOIN community_memberships m ON m.community_id = c.id
                 WHERE m.user_id = ?1
                 ORDER BY c.name, c.created_at",
            )?;

            let rows = stmt
                .query_map([user_id], |row| Ok((community_from_row(row)?, row.get(4)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Memberships --

    pub fn membership_role(&self, community_id: &str, user_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT role FROM community_memberships WHERE community_id = ?1 AND user_id = ?2",
                [community_id, user_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn list_members(&self, community_id: &str) -> Result<Vec<MembershipRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.community_id, m.user_id, COALESCE(u.username, 'unknown'),
                        m.role, m.added_by, m.created_at
                 FROM community_memberships m
                 LEFT JOIN users u ON u.id = m.user_id
                 WHERE m.community_id = ?1
                 ORDER BY u.username",
            )?;

            let rows = stmt
                .query_map([community_id], membership_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Adds a membership row. Returns false, leaving the existing row
    /// untouched, when the user is already a member.
    pub fn add_member(
        &self,
        community_id: &str,
        user_id: &str,
        role: &str,
        added_by: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO community_memberships (community_id, user_id, role, added_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(community_id, user_id) DO NOTHING",
                rusqlite::params![community_id, user_id, role, added_by, now_timestamp()],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_membership(&self, community_id: &str, user_id: &str) -> Result<Option<MembershipRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT m.community_id, m.user_id, COALESCE(u.username, 'unknown'),
                        m.role, m.added_by, m.created_at
                 FROM community_memberships m
                 LEFT JOIN users u ON u.id = m.user_id
                 WHERE m.community_id = ?1 AND m.user_id = ?2",
                [community_id, user_id],
                membership_from_row,
            )
            .optional()
        })
    }
}

fn community_from_row(row: &Row<'_>) -> rusqlite::Result<CommunityRow> {
    Ok(CommunityRow {
        id: row.get(0)?,
        name: row.get(1)?,
        created_by: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<MembershipRow> {
    Ok(MembershipRow {
        community_id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        role: row.get(3)?,
        added_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}
