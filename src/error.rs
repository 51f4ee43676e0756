//! Error types for bookshelf
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert request-time failures to HTTP responses at the boundary
//! (see [`http_mapper`]).

pub mod http_mapper;

use crate::access_control::Permission;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Seeding error: {0}")]
    Seed(#[from] SeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// Data-store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Duplicate value for {field}")]
    Duplicate { field: &'static str },
}

impl StoreError {
    /// Map a unique-constraint violation onto [`StoreError::Duplicate`]
    pub fn from_insert(error: sqlx::Error, field: &'static str) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate { field }
            }
            _ => StoreError::Database(error),
        }
    }
}

/// Identity and credential errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Identity '{0}' not found")]
    UnknownIdentity(String),

    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("Password hashing failed: {0}")]
    Crypto(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the seeding routines
#[derive(Error, Debug)]
pub enum SeedError {
    /// The permission registry is missing an entry; migrations have not run.
    #[error("Permission '{codename}' does not exist; run migrations before seeding")]
    MissingPermission { codename: &'static str },

    #[error("Group '{name}' does not exist; run seed-groups first")]
    MissingGroup { name: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for SeedError {
    fn from(error: sqlx::Error) -> Self {
        SeedError::Store(StoreError::Database(error))
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        AuthError::Store(StoreError::Database(error))
    }
}

/// Guard rejection for an authenticated identity lacking a permission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Access denied for '{operation}': missing permission '{missing}'")]
pub struct AccessDeniedError {
    pub operation: String,
    pub missing: Permission,
}

impl AccessDeniedError {
    pub fn new(operation: impl Into<String>, missing: Permission) -> Self {
        Self {
            operation: operation.into(),
            missing,
        }
    }
}

/// Field-scoped validation messages, keyed by field name
///
/// Serializes as `{"field": ["reason", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors for a single field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> std::result::Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Request-time errors surfaced to API callers
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid identity was presented for a gated operation
    #[error("Authentication required: {0}")]
    AuthenticationRequired(&'static str),

    #[error(transparent)]
    PermissionDenied(#[from] AccessDeniedError),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The request body could not be parsed at all
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Page number out of range or not a positive integer
    #[error("Invalid page")]
    InvalidPage,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_authenticated() -> Self {
        ApiError::AuthenticationRequired("Authentication credentials were not provided.")
    }

    pub fn invalid_token() -> Self {
        ApiError::AuthenticationRequired("Invalid token.")
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiError::Validation(FieldErrors::single(
                "non_field_errors",
                "Unable to log in with provided credentials.",
            )),
            AuthError::InvalidToken => ApiError::invalid_token(),
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::UnknownIdentity(email) => ApiError::NotFound(email),
            AuthError::Crypto(message) => ApiError::Internal(message),
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for request handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
