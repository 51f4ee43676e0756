//! API token rows (one per identity)

use crate::error::StoreError;
use sqlx::SqliteConnection;

pub async fn find_for_identity(
    conn: &mut SqliteConnection,
    identity_id: i64,
) -> Result<Option<String>, StoreError> {
    let key = sqlx::query_scalar::<_, String>("SELECT key FROM auth_tokens WHERE identity_id = ?")
        .bind(identity_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(key)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    key: &str,
    identity_id: i64,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO auth_tokens (key, identity_id) VALUES (?, ?)")
        .bind(key)
        .bind(identity_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::from_insert(e, "key"))?;
    Ok(())
}

/// Identity owning `key`, if any
pub async fn identity_for(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<i64>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT identity_id FROM auth_tokens WHERE key = ?")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}
