/// Project access resolution
///
/// Every project-scoped operation answers two questions before touching
/// data: can this user see the project, and can they manage it. The rules:
///
/// 1. **Admin bypass**: `is_admin` users access and manage every project.
/// 2. **Membership**: everyone else needs a membership row; the role
///    decides what they may do (see [`MemberRole`]).
///
/// Checks take an executor so callers can run them inside the same
/// transaction as the mutation they guard; the answer then cannot go
/// stale between check and write.
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::access;
/// use projecthub_shared::models::user::User;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user: User, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = pool.begin().await?;
/// access::require_manage(&mut *tx, &user, project_id).await?;
/// // ... mutate inside the same transaction ...
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::membership::{MemberRole, Membership};
use crate::models::user::User;

/// True when the user may read the project and its contents
pub async fn can_access<'e, E>(executor: E, user: &User, project_id: Uuid) -> StoreResult<bool>
where
    E: PgExecutor<'e>,
{
    if user.is_admin {
        return Ok(true);
    }

    Ok(Membership::find(executor, project_id, user.id).await?.is_some())
}

/// True when the user may edit project metadata, manage members, or
/// delete tasks they did not create
pub async fn can_manage<'e, E>(executor: E, user: &User, project_id: Uuid) -> StoreResult<bool>
where
    E: PgExecutor<'e>,
{
    if user.is_admin {
        return Ok(true);
    }

    let role = role_of(executor, user, project_id).await?;
    Ok(role.is_some_and(|r| r.can_manage()))
}

/// The user's effective role in the project, if any
///
/// Admins without a membership row resolve to `Owner`.
pub async fn role_of<'e, E>(
    executor: E,
    user: &User,
    project_id: Uuid,
) -> StoreResult<Option<MemberRole>>
where
    E: PgExecutor<'e>,
{
    let role = Membership::find(executor, project_id, user.id)
        .await?
        .map(|m| m.role);

    if role.is_none() && user.is_admin {
        return Ok(Some(MemberRole::Owner));
    }

    Ok(role)
}

/// Fails with [`StoreError::Forbidden`] unless the user can read the project
///
/// [`StoreError::Forbidden`]: crate::error::StoreError::Forbidden
pub async fn require_access<'e, E>(executor: E, user: &User, project_id: Uuid) -> StoreResult<()>
where
    E: PgExecutor<'e>,
{
    if can_access(executor, user, project_id).await? {
        Ok(())
    } else {
        Err(StoreError::project_forbidden(project_id))
    }
}

/// Fails with [`StoreError::Forbidden`] unless the user can manage the project
///
/// [`StoreError::Forbidden`]: crate::error::StoreError::Forbidden
pub async fn require_manage<'e, E>(executor: E, user: &User, project_id: Uuid) -> StoreResult<()>
where
    E: PgExecutor<'e>,
{
    if can_manage(executor, user, project_id).await? {
        Ok(())
    } else {
        Err(StoreError::project_forbidden(project_id))
    }
}

/// Fails unless the user's role meets `required` in the hierarchy
pub async fn require_role<'e, E>(
    executor: E,
    user: &User,
    project_id: Uuid,
    required: MemberRole,
) -> StoreResult<()>
where
    E: PgExecutor<'e>,
{
    let role = role_of(executor, user, project_id).await?;

    match role {
        Some(r) if r.has_permission(required) => Ok(()),
        _ => Err(StoreError::project_forbidden(project_id)),
    }
}

/// All project IDs the user may read
///
/// This is the scope every analytics query is restricted to. Admins get
/// every project; everyone else gets the projects they are a member of.
pub async fn accessible_project_ids<'e, E>(executor: E, user: &User) -> StoreResult<Vec<Uuid>>
where
    E: PgExecutor<'e>,
{
    let ids: Vec<(Uuid,)> = if user.is_admin {
        sqlx::query_as("SELECT id FROM projects")
            .fetch_all(executor)
            .await?
    } else {
        sqlx::query_as("SELECT project_id FROM project_members WHERE user_id = $1")
            .bind(user.id)
            .fetch_all(executor)
            .await?
    };

    Ok(ids.into_iter().map(|(id,)| id).collect())
}
