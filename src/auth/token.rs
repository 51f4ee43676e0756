//! API token generation and `Authorization` header parsing
//!
//! Tokens are 40 lowercase hex characters (160 random bits). Clients send
//! them as `Authorization: Token <key>`; the `Bearer` scheme is accepted too.

use crate::error::AuthError;
use std::fmt::Write;

/// Length of a token key in characters
pub const TOKEN_LENGTH: usize = 40;

/// Generate a fresh random token key
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_LENGTH / 2] = rand::random();
    bytes.iter().fold(String::with_capacity(TOKEN_LENGTH), |mut key, b| {
        let _ = write!(key, "{b:02x}");
        key
    })
}

/// Extract the token key from an `Authorization` header value
///
/// Returns `Ok(None)` for schemes this API does not handle (e.g. `Basic`),
/// which leaves the request anonymous.
pub fn parse_authorization(header: &str) -> Result<Option<&str>, AuthError> {
    let mut parts = header.split_whitespace();
    let Some(scheme) = parts.next() else {
        return Err(AuthError::InvalidToken);
    };

    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Ok(None);
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(key)),
        // No key, or a key containing spaces
        _ => Err(AuthError::InvalidToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_parse_token_scheme() {
        assert_eq!(parse_authorization("Token abc123").unwrap(), Some("abc123"));
        assert_eq!(parse_authorization("token abc123").unwrap(), Some("abc123"));
        assert_eq!(
            parse_authorization("Bearer abc123").unwrap(),
            Some("abc123")
        );
    }

    #[test]
    fn test_parse_other_scheme_is_anonymous() {
        assert_eq!(parse_authorization("Basic dXNlcjpwYXNz").unwrap(), None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_authorization("Token").is_err());
        assert!(parse_authorization("Token a b").is_err());
        assert!(parse_authorization("").is_err());
    }
}
