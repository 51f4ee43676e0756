//! Groups, the permission registry, and group grants

use crate::access_control::{Permission, PermissionSet};
use crate::error::StoreError;
use sqlx::SqliteConnection;
use tracing::warn;

/// A group and the permissions granted to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub permissions: PermissionSet,
}

/// Registry id for a permission, if the registry has it
pub async fn permission_id(
    conn: &mut SqliteConnection,
    permission: Permission,
) -> Result<Option<i64>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM auth_permissions WHERE codename = ?")
        .bind(permission.codename())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<i64>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM auth_groups WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn insert(conn: &mut SqliteConnection, name: &str) -> Result<i64, StoreError> {
    sqlx::query_scalar::<_, i64>("INSERT INTO auth_groups (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| StoreError::from_insert(e, "name"))
}

/// Grant a permission to a group; `false` if it was already granted
pub async fn grant(
    conn: &mut SqliteConnection,
    group_id: i64,
    permission_id: i64,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO auth_group_permissions (group_id, permission_id) VALUES (?, ?)",
    )
    .bind(group_id)
    .bind(permission_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn permissions_of(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> Result<PermissionSet, StoreError> {
    let codenames = sqlx::query_scalar::<_, String>(
        "SELECT p.codename FROM auth_permissions p \
         JOIN auth_group_permissions gp ON gp.permission_id = p.id \
         WHERE gp.group_id = ?",
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(parse_codenames(codenames))
}

/// Every group with its grants, ordered by id
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<GroupSummary>, StoreError> {
    let groups = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM auth_groups ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    let mut summaries = Vec::with_capacity(groups.len());
    for (id, name) in groups {
        let permissions = permissions_of(conn, id).await?;
        summaries.push(GroupSummary {
            id,
            name,
            permissions,
        });
    }
    Ok(summaries)
}

/// Map registry codenames onto [`Permission`], skipping unknown entries
pub(crate) fn parse_codenames(codenames: impl IntoIterator<Item = String>) -> PermissionSet {
    codenames
        .into_iter()
        .filter_map(|codename| {
            let parsed = Permission::try_parse(&codename);
            if parsed.is_none() {
                warn!(codename = %codename, "Ignoring unknown permission codename");
            }
            parsed
        })
        .collect()
}
