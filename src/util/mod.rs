//! Utility types shared across the application.

mod secret;

pub use secret::SecretString;
