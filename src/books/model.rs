//! Catalogue types
//!
//! Representations returned by the API and written to the store.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A book row
///
/// `author` is the id of the referenced [`Author`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    pub author: i64,
}

/// Fully validated values for a book write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub publication_year: i32,
    pub author: i64,
}

/// An author row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// An author together with the books referencing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorWithBooks {
    pub id: i64,
    pub name: String,
    pub books: Vec<Book>,
}

impl AuthorWithBooks {
    pub fn new(author: Author, books: Vec<Book>) -> Self {
        Self {
            id: author.id,
            name: author.name,
            books,
        }
    }
}

/// Exact-match filters for book listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub author_id: Option<i64>,
    pub publication_year: Option<i32>,
}

impl BookFilter {
    /// Query-string pairs for this filter, used when building page links
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(author_id) = self.author_id {
            pairs.push(("author_id", author_id.to_string()));
        }
        if let Some(year) = self.publication_year {
            pairs.push(("publication_year", year.to_string()));
        }
        pairs
    }
}
