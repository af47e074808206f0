/// Project membership model and database operations
///
/// Memberships are the (project, user, role) rows that grant scoped access.
/// A project must keep at least one member with role `owner` at all times:
/// removing or demoting the sole owner fails with
/// [`StoreError::InvalidState`] rather than leaving an ownerless project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('owner', 'admin', 'member', 'viewer');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: full control, including member management and deletion
/// - **admin**: manage project metadata, members, and all tasks
/// - **member**: create and work on tasks
/// - **viewer**: read-only access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Role of a user within one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
            MemberRole::Viewer => "viewer",
        }
    }

    /// Owners and admins can edit project metadata, manage members, and
    /// delete other members' tasks
    pub fn can_manage(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }

    /// Hierarchy comparison: owner > admin > member > viewer
    pub fn has_permission(&self, required: MemberRole) -> bool {
        self.level() >= required.level()
    }

    fn level(&self) -> u8 {
        match self {
            MemberRole::Owner => 4,
            MemberRole::Admin => 3,
            MemberRole::Member => 2,
            MemberRole::Viewer => 1,
        }
    }
}

/// Membership row linking a user to a project with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for adding a user to a project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMembership {
    pub user_id: Uuid,

    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

impl Membership {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if the user is already a member.
    pub async fn create<'e, E>(
        executor: E,
        project_id: Uuid,
        data: CreateMembership,
    ) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, role, joined_at
            "#,
        )
        .bind(project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    /// Finds the membership row for (project, user)
    pub async fn find<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Lists all members of a project, oldest first
    pub async fn list_by_project<'e, E>(executor: E, project_id: Uuid) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(memberships)
    }

    /// Counts members of a project
    pub async fn count_by_project<'e, E>(executor: E, project_id: Uuid) -> StoreResult<i64>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM project_members WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    /// Changes a member's role
    ///
    /// Demoting the sole owner is rejected: every project must keep at
    /// least one owner-role member.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no membership row exists,
    /// `StoreError::InvalidState` when the change would leave the project
    /// without an owner.
    pub async fn update_role(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> StoreResult<Self> {
        let current = Self::find(&mut *conn, project_id, user_id)
            .await?
            .ok_or(StoreError::NotFound("membership"))?;

        if current.role == MemberRole::Owner
            && role != MemberRole::Owner
            && Self::owner_count(&mut *conn, project_id).await? <= 1
        {
            return Err(StoreError::InvalidState(
                "cannot demote the only owner of a project".to_string(),
            ));
        }

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE project_members
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
            RETURNING id, project_id, user_id, role, joined_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut *conn)
        .await?;

        Ok(membership)
    }

    /// Removes a user from a project
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no membership row exists,
    /// `StoreError::InvalidState` when the member is the project's only
    /// owner.
    pub async fn remove(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<()> {
        let current = Self::find(&mut *conn, project_id, user_id)
            .await?
            .ok_or(StoreError::NotFound("membership"))?;

        if current.role == MemberRole::Owner
            && Self::owner_count(&mut *conn, project_id).await? <= 1
        {
            return Err(StoreError::InvalidState(
                "cannot remove the only owner of a project".to_string(),
            ));
        }

        sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn owner_count<'e, E>(executor: E, project_id: Uuid) -> StoreResult<i64>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM project_members WHERE project_id = $1 AND role = 'owner'",
        )
        .bind(project_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Admin.as_str(), "admin");
        assert_eq!(MemberRole::Member.as_str(), "member");
        assert_eq!(MemberRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_can_manage() {
        assert!(MemberRole::Owner.can_manage());
        assert!(MemberRole::Admin.can_manage());
        assert!(!MemberRole::Member.can_manage());
        assert!(!MemberRole::Viewer.can_manage());
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(MemberRole::Owner.has_permission(MemberRole::Admin));
        assert!(MemberRole::Admin.has_permission(MemberRole::Member));
        assert!(MemberRole::Member.has_permission(MemberRole::Viewer));
        assert!(!MemberRole::Viewer.has_permission(MemberRole::Member));
        assert!(!MemberRole::Admin.has_permission(MemberRole::Owner));
    }

    #[test]
    fn test_default_role_is_member() {
        let data: CreateMembership = serde_json::from_str(
            r#"{"user_id": "550e8400-e29b-41d4-a716-446655440000"}"#,
        )
        .unwrap();
        assert_eq!(data.role, MemberRole::Member);
    }
}
