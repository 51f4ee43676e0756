//! Author rows

use crate::books::model::Author;
use crate::error::StoreError;
use sqlx::SqliteConnection;

pub async fn insert(conn: &mut SqliteConnection, name: &str) -> Result<Author, StoreError> {
    let author =
        sqlx::query_as::<_, Author>("INSERT INTO authors (name) VALUES (?) RETURNING id, name")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
    Ok(author)
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Author>, StoreError> {
    let author = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(author)
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Author>, StoreError> {
    let authors = sqlx::query_as::<_, Author>("SELECT id, name FROM authors ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(authors)
}

pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}
