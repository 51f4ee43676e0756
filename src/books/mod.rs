//! Book catalogue
//!
//! Types, payload validation, pagination and the operations behind the
//! `/books/` and `/authors/` endpoints. Operations here assume the caller has
//! already passed the permission guard.

pub mod model;
pub mod pagination;
pub mod service;
pub mod validation;

pub use model::{Author, AuthorWithBooks, Book, BookFilter, NewBook};
pub use pagination::{Page, PageRequest};
pub use validation::{WriteMode, current_year};
