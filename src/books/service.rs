//! Catalogue operations
//!
//! Each operation takes a connection so handlers can run it on a pooled
//! connection and tests can run it against an in-memory database.

use crate::books::model::{Author, AuthorWithBooks, Book, BookFilter, NewBook};
use crate::books::pagination::{Page, PageRequest};
use crate::books::validation::{WriteMode, parse_author_payload, parse_book_payload};
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::store::{author, book};
use serde_json::Value;
use sqlx::SqliteConnection;
use tracing::info;

const NOT_A_NUMBER: &str = "Enter a whole number.";

/// Build a listing filter from raw query values; blank values are ignored
pub fn parse_filter(
    author_id: Option<&str>,
    publication_year: Option<&str>,
) -> Result<BookFilter, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut filter = BookFilter::default();

    if let Some(raw) = author_id.map(str::trim).filter(|raw| !raw.is_empty()) {
        match raw.parse() {
            Ok(id) => filter.author_id = Some(id),
            Err(_) => errors.add("author_id", NOT_A_NUMBER),
        }
    }
    if let Some(raw) = publication_year.map(str::trim).filter(|raw| !raw.is_empty()) {
        match raw.parse() {
            Ok(year) => filter.publication_year = Some(year),
            Err(_) => errors.add("publication_year", NOT_A_NUMBER),
        }
    }

    errors.into_result()?;
    Ok(filter)
}

/// One page of books matching `filter`, linked under `path`
pub async fn list_books(
    conn: &mut SqliteConnection,
    filter: &BookFilter,
    page: PageRequest,
    path: &str,
) -> ApiResult<Page<Book>> {
    let count = book::count(conn, filter).await?;
    page.check_in_range(count).map_err(|_| ApiError::InvalidPage)?;

    let results = book::list(conn, filter, page.limit(), page.offset()).await?;
    Ok(page.into_page(count, results, path, &filter.query_pairs()))
}

pub async fn get_book(conn: &mut SqliteConnection, id: i64) -> ApiResult<Book> {
    book::get(conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("book {id}")))
}

/// Validate a full payload and insert it
pub async fn create_book(
    conn: &mut SqliteConnection,
    payload: &Value,
    current_year: i32,
) -> ApiResult<Book> {
    let (changes, mut errors) = parse_book_payload(payload, WriteMode::Full, current_year);
    check_author(conn, changes.author, &mut errors).await?;
    errors.into_result()?;

    let Some(new_book) = changes.into_new_book() else {
        return Err(ApiError::Internal("validated book payload is incomplete".into()));
    };

    let created = book::insert(conn, &new_book).await?;
    info!(book = created.id, title = %created.title, "Created book");
    Ok(created)
}

/// Replace (`Full`) or patch (`Partial`) an existing book
pub async fn update_book(
    conn: &mut SqliteConnection,
    id: i64,
    payload: &Value,
    mode: WriteMode,
    current_year: i32,
) -> ApiResult<Book> {
    let existing = get_book(conn, id).await?;

    let (changes, mut errors) = parse_book_payload(payload, mode, current_year);
    check_author(conn, changes.author, &mut errors).await?;
    errors.into_result()?;

    let merged = changes.apply_to(NewBook {
        title: existing.title,
        publication_year: existing.publication_year,
        author: existing.author,
    });

    let updated = book::update(conn, id, &merged)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("book {id}")))?;
    info!(book = id, "Updated book");
    Ok(updated)
}

pub async fn delete_book(conn: &mut SqliteConnection, id: i64) -> ApiResult<()> {
    if !book::delete(conn, id).await? {
        return Err(ApiError::not_found(format!("book {id}")));
    }
    info!(book = id, "Deleted book");
    Ok(())
}

/// Every author with their books
pub async fn list_authors(conn: &mut SqliteConnection) -> ApiResult<Vec<AuthorWithBooks>> {
    let authors = author::list(conn).await?;
    let mut nested = Vec::with_capacity(authors.len());
    for author in authors {
        let books = book::by_author(conn, author.id).await?;
        nested.push(AuthorWithBooks::new(author, books));
    }
    Ok(nested)
}

pub async fn get_author(conn: &mut SqliteConnection, id: i64) -> ApiResult<AuthorWithBooks> {
    let Some(author) = author::get(conn, id).await? else {
        return Err(ApiError::not_found(format!("author {id}")));
    };
    let books = book::by_author(conn, id).await?;
    Ok(AuthorWithBooks::new(author, books))
}

pub async fn create_author(conn: &mut SqliteConnection, payload: &Value) -> ApiResult<Author> {
    let name = parse_author_payload(payload)?;
    let created = author::insert(conn, &name).await?;
    info!(author = created.id, name = %created.name, "Created author");
    Ok(created)
}

/// Record an error when a referenced author does not exist
async fn check_author(
    conn: &mut SqliteConnection,
    author_id: Option<i64>,
    errors: &mut FieldErrors,
) -> ApiResult<()> {
    if let Some(id) = author_id
        && !author::exists(conn, id).await?
    {
        errors.add(
            "author",
            format!("Invalid pk \"{id}\" - object does not exist."),
        );
    }
    Ok(())
}
