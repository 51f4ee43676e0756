//! Authentication module
//!
//! Identities authenticate with an email and password to obtain an API token,
//! then present that token on every request. Passwords are stored as Argon2id
//! hashes; tokens are random 160-bit keys, one per identity.

pub mod extractor;
pub mod identity;
pub mod manager;
pub mod password;
pub mod token;

pub use extractor::CurrentIdentity;
pub use identity::Identity;
pub use manager::{
    AccountKind, authenticate, create_superuser, create_user, normalize_email, obtain_token,
};
pub use password::{hash_password, verify_password};
