//! Secret string type for passwords, peppers and API tokens.
//!
//! Keeps sensitive values out of `Debug`/`Display` output so they never end
//! up in logs or error messages.

use serde::Deserialize;
use std::fmt;

/// A wrapper for secrets that prevents accidental logging.
///
/// `Debug` and `Display` print `[REDACTED]`; the value is only reachable
/// through [`SecretString::expose_secret`].
///
/// # Example
/// ```ignore
/// let password = SecretString::new("testpass123");
/// assert_eq!(format!("{:?}", password), "[REDACTED]");
/// hash_password(password.expose_secret(), None)?;
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicitly expose the secret value.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Best-effort only; copies made elsewhere are not cleared.
        self.0.clear();
        self.0.shrink_to_fit();
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_is_redacted() {
        let secret = SecretString::new("testpass123");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_secret() {
        let secret = SecretString::from("pepper!".to_string());
        assert_eq!(secret.expose_secret(), "pepper!");
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_deserialize_inside_struct() {
        #[derive(Deserialize, Debug)]
        struct Credentials {
            password: SecretString,
        }

        let creds: Credentials = serde_json::from_str(r#"{"password": "hunter2"}"#).unwrap();
        assert_eq!(creds.password.expose_secret(), "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
