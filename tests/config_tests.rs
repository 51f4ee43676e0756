//! Configuration loading tests

use bookshelf::config::{LogFormat, load_config, load_config_from_str};
use bookshelf::error::ConfigError;
use std::env;
use std::fs;
use tempfile::tempdir;

const MINIMAL_CONFIG: &str = r#"
[database]
url = "sqlite::memory:"
"#;

const FULL_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 9000

[database]
url = "sqlite://data/books.db"
max_connections = 8

[api]
page_size = 25

[auth]
password_pepper = "pepper-value"

[security]
content_security_policy = "default-src 'self'; img-src *"
frame_options = "SAMEORIGIN"
referrer_policy = "no-referrer"
allowed_origins = ["https://books.example.com"]

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn test_minimal_config_uses_defaults() {
    let config = load_config_from_str(MINIMAL_CONFIG).unwrap();

    assert_eq!(config.database.url, "sqlite::memory:");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.api.page_size, 10);
    assert_eq!(config.security.content_security_policy, "default-src 'self'");
    assert_eq!(config.security.frame_options, "DENY");
    assert_eq!(config.security.referrer_policy, "same-origin");
    assert!(config.security.allowed_origins.is_empty());
    assert!(config.auth.pepper().is_none());
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    // Server
    assert_eq!(config.server.bind_address(), "0.0.0.0:9000");

    // Database
    assert_eq!(config.database.url, "sqlite://data/books.db");
    assert_eq!(config.database.max_connections, 8);

    // API
    assert_eq!(config.api.page_size, 25);

    // Auth
    assert_eq!(config.auth.pepper(), Some("pepper-value"));

    // Security
    assert_eq!(config.security.frame_options, "SAMEORIGIN");
    assert_eq!(
        config.security.allowed_origins,
        vec!["https://books.example.com".to_string()]
    );

    // Logging
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_pepper_is_redacted_in_debug_output() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();
    let debug = format!("{:?}", config.auth);
    assert!(!debug.contains("pepper-value"));
}

#[test]
fn test_invalid_values_rejected() {
    let cases = [
        "[server]\nport = 0\n",
        "[database]\nmax_connections = 0\n",
        "[database]\nurl = \"mysql://localhost/books\"\n",
        "[api]\npage_size = 0\n",
        "[security]\nallowed_origins = [\"books.example.com\"]\n",
    ];

    for toml in cases {
        assert!(
            matches!(load_config_from_str(toml), Err(ConfigError::Invalid { .. })),
            "expected rejection for:\n{toml}"
        );
    }
}

#[test]
fn test_malformed_toml_rejected() {
    let result = load_config_from_str("[server\nport = 1");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_unknown_log_format_rejected() {
    let result = load_config_from_str("[logging]\nformat = \"xml\"\n");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let result = load_config(Some("/nonexistent/bookshelf.toml"));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial_test::serial]
fn test_file_config_loaded() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bookshelf.toml");
    fs::write(&config_path, FULL_CONFIG).unwrap();

    unsafe {
        env::remove_var("BOOKSHELF__DATABASE__URL");
        env::remove_var("DATABASE_URL");
    }

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.database.url, "sqlite://data/books.db");
}

#[test]
#[serial_test::serial]
fn test_env_overrides_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bookshelf.toml");
    fs::write(&config_path, FULL_CONFIG).unwrap();

    unsafe {
        env::set_var("BOOKSHELF__SERVER__PORT", "9100");
        env::set_var("BOOKSHELF__API__PAGE_SIZE", "5");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    // Cleanup
    unsafe {
        env::remove_var("BOOKSHELF__SERVER__PORT");
        env::remove_var("BOOKSHELF__API__PAGE_SIZE");
    }

    let config = config.unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.api.page_size, 5);
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
#[serial_test::serial]
fn test_database_url_fallback() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bookshelf.toml");
    fs::write(&config_path, MINIMAL_CONFIG).unwrap();

    unsafe {
        env::remove_var("BOOKSHELF__DATABASE__URL");
        env::set_var("DATABASE_URL", "sqlite://fallback.db");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("DATABASE_URL");
    }

    assert_eq!(config.unwrap().database.url, "sqlite://fallback.db");
}

#[test]
#[serial_test::serial]
fn test_prefixed_database_url_wins_over_fallback() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bookshelf.toml");
    fs::write(&config_path, MINIMAL_CONFIG).unwrap();

    unsafe {
        env::set_var("BOOKSHELF__DATABASE__URL", "sqlite://priority.db");
        env::set_var("DATABASE_URL", "sqlite://fallback.db");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("BOOKSHELF__DATABASE__URL");
        env::remove_var("DATABASE_URL");
    }

    assert_eq!(config.unwrap().database.url, "sqlite://priority.db");
}
