//! Book rows

use crate::books::model::{Book, BookFilter, NewBook};
use crate::error::StoreError;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &BookFilter) {
    if let Some(author_id) = filter.author_id {
        builder.push(" AND author_id = ").push_bind(author_id);
    }
    if let Some(year) = filter.publication_year {
        builder.push(" AND publication_year = ").push_bind(year);
    }
}

/// Number of rows matching `filter`
pub async fn count(conn: &mut SqliteConnection, filter: &BookFilter) -> Result<i64, StoreError> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM books WHERE 1 = 1");
    push_filter(&mut builder, filter);

    let count = builder
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// One window of rows matching `filter`, ordered by id
pub async fn list(
    conn: &mut SqliteConnection,
    filter: &BookFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Book>, StoreError> {
    let mut builder = QueryBuilder::new(
        "SELECT id, title, publication_year, author_id AS author FROM books WHERE 1 = 1",
    );
    push_filter(&mut builder, filter);
    builder
        .push(" ORDER BY id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let books = builder
        .build_query_as::<Book>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(books)
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Book>, StoreError> {
    let book = sqlx::query_as::<_, Book>(
        "SELECT id, title, publication_year, author_id AS author FROM books WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(book)
}

pub async fn by_author(
    conn: &mut SqliteConnection,
    author_id: i64,
) -> Result<Vec<Book>, StoreError> {
    let books = sqlx::query_as::<_, Book>(
        "SELECT id, title, publication_year, author_id AS author FROM books \
         WHERE author_id = ? ORDER BY id",
    )
    .bind(author_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(books)
}

pub async fn insert(conn: &mut SqliteConnection, book: &NewBook) -> Result<Book, StoreError> {
    let book = sqlx::query_as::<_, Book>(
        "INSERT INTO books (title, publication_year, author_id) VALUES (?, ?, ?) \
         RETURNING id, title, publication_year, author_id AS author",
    )
    .bind(&book.title)
    .bind(book.publication_year)
    .bind(book.author)
    .fetch_one(&mut *conn)
    .await?;
    Ok(book)
}

/// Overwrite every column of a row; `None` if it does not exist
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    book: &NewBook,
) -> Result<Option<Book>, StoreError> {
    let book = sqlx::query_as::<_, Book>(
        "UPDATE books SET title = ?, publication_year = ?, author_id = ? WHERE id = ? \
         RETURNING id, title, publication_year, author_id AS author",
    )
    .bind(&book.title)
    .bind(book.publication_year)
    .bind(book.author)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(book)
}

/// Delete a row; `false` if it did not exist
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
