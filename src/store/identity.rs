//! Identity rows, memberships and direct grants

use crate::access_control::{PermissionSet, effective_permissions};
use crate::auth::Identity;
use crate::error::StoreError;
use crate::store::group::parse_codenames;
use sqlx::{FromRow, SqliteConnection};
use std::collections::BTreeMap;

/// Stored identity, including the credential hash
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Values for a new identity row
#[derive(Debug, Clone)]
pub struct NewIdentity<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_staff: bool,
    pub is_superuser: bool,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    identity: &NewIdentity<'_>,
) -> Result<i64, StoreError> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO identities (email, password_hash, is_staff, is_superuser) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(identity.email)
    .bind(identity.password_hash)
    .bind(identity.is_staff)
    .bind(identity.is_superuser)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::from_insert(e, "email"))
}

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<IdentityRecord>, StoreError> {
    let record = sqlx::query_as::<_, IdentityRecord>(
        "SELECT id, email, password_hash, is_active, is_staff, is_superuser \
         FROM identities WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(record)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<IdentityRecord>, StoreError> {
    let record = sqlx::query_as::<_, IdentityRecord>(
        "SELECT id, email, password_hash, is_active, is_staff, is_superuser \
         FROM identities WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(record)
}

/// Activate or deactivate; `false` if the identity does not exist
pub async fn set_active(
    conn: &mut SqliteConnection,
    id: i64,
    active: bool,
) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE identities SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add a group membership; `false` if it already existed
pub async fn add_to_group(
    conn: &mut SqliteConnection,
    identity_id: i64,
    group_id: i64,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO identity_groups (identity_id, group_id) VALUES (?, ?)",
    )
    .bind(identity_id)
    .bind(group_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Grant a permission directly; `false` if it was already granted
pub async fn grant_permission(
    conn: &mut SqliteConnection,
    identity_id: i64,
    permission_id: i64,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO identity_permissions (identity_id, permission_id) VALUES (?, ?)",
    )
    .bind(identity_id)
    .bind(permission_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn direct_permissions(
    conn: &mut SqliteConnection,
    identity_id: i64,
) -> Result<PermissionSet, StoreError> {
    let codenames = sqlx::query_scalar::<_, String>(
        "SELECT p.codename FROM auth_permissions p \
         JOIN identity_permissions ip ON ip.permission_id = p.id \
         WHERE ip.identity_id = ?",
    )
    .bind(identity_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(parse_codenames(codenames))
}

/// Each group the identity belongs to, with that group's grants
///
/// Groups without any grant are included with an empty set.
pub async fn group_permissions(
    conn: &mut SqliteConnection,
    identity_id: i64,
) -> Result<BTreeMap<String, PermissionSet>, StoreError> {
    let rows = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT g.name, p.codename FROM identity_groups ig \
         JOIN auth_groups g ON g.id = ig.group_id \
         LEFT JOIN auth_group_permissions gp ON gp.group_id = g.id \
         LEFT JOIN auth_permissions p ON p.id = gp.permission_id \
         WHERE ig.identity_id = ?",
    )
    .bind(identity_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (group, codename) in rows {
        let entry = groups.entry(group).or_default();
        if let Some(codename) = codename {
            entry.push(codename);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(group, codenames)| (group, parse_codenames(codenames)))
        .collect())
}

/// Build the request-time [`Identity`], resolving effective permissions
pub async fn load_identity(
    conn: &mut SqliteConnection,
    record: IdentityRecord,
) -> Result<Identity, StoreError> {
    let direct = direct_permissions(conn, record.id).await?;
    let groups = group_permissions(conn, record.id).await?;
    let permissions = effective_permissions(&direct, groups.values());

    Ok(Identity {
        id: record.id,
        email: record.email,
        is_active: record.is_active,
        is_staff: record.is_staff,
        is_superuser: record.is_superuser,
        groups: groups.into_keys().collect(),
        permissions,
    })
}
