//! Bookshelf
//!
//! A permission-gated REST API for a book catalogue.
//!
//! ## Features
//!
//! - **Groups and permissions**: Viewers, Editors and Admins, seeded idempotently
//! - **Permission guard** on every Book operation (401 anonymous, 403 denied)
//! - **Token authentication** with Argon2id password hashes
//! - **Book CRUD** with validation, filters and page-number pagination
//! - **Flexible configuration** via TOML files and environment variables
//!
//! ## Access Control Model
//!
//! ```text
//! effective permissions = direct grants ∪ grants of every group
//! ```
//!
//! | Group   | view | create | edit | delete |
//! |---------|------|--------|------|--------|
//! | Viewers | ✓    |        |      |        |
//! | Editors | ✓    | ✓      | ✓    |        |
//! | Admins  | ✓    | ✓      | ✓    | ✓      |
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [database]
//! url = "sqlite://bookshelf.db"
//!
//! [api]
//! page_size = 20
//! ```

pub mod access_control;
pub mod auth;
pub mod books;
pub mod config;
pub mod error;
pub mod seed;
pub mod server;
pub mod store;
pub mod util;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{ApiError, AppError, Result};
pub use server::{AppState, router};
pub use store::Store;
