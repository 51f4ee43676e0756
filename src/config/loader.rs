//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (BOOKSHELF__*, then DATABASE_URL)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "bookshelf.toml",
    ".bookshelf.toml",
    "~/.config/bookshelf/config.toml",
    "/etc/bookshelf/config.toml",
];

/// Environment variable prefix; `__` separates nested keys
const ENV_PREFIX: &str = "BOOKSHELF";

/// Largest accepted page size
const MAX_PAGE_SIZE: u32 = 1000;

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with BOOKSHELF prefix
    // e.g., BOOKSHELF__SERVER__PORT, BOOKSHELF__DATABASE__URL
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("security.allowed_origins"),
    );

    // 4. Conventional DATABASE_URL, unless the prefixed variable is set
    if std::env::var("BOOKSHELF__DATABASE__URL").is_err()
        && let Ok(url) = std::env::var("DATABASE_URL")
    {
        builder = builder
            .set_override("database.url", url)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    // Build and deserialize
    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    // Validate the configuration
    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // Validate database URL
    if config.database.url.is_empty() {
        return Err(ConfigError::Missing {
            field: "database.url".to_string(),
        });
    }

    if !config.database.url.starts_with("sqlite:") {
        return Err(ConfigError::Invalid {
            message: format!(
                "database.url must be a sqlite: URL, got: {}",
                config.database.url
            ),
        });
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::Invalid {
            message: "database.max_connections must be greater than 0".to_string(),
        });
    }

    // Validate port
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    // Validate pagination
    if config.api.page_size == 0 || config.api.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid {
            message: format!(
                "api.page_size must be between 1 and {}, got: {}",
                MAX_PAGE_SIZE, config.api.page_size
            ),
        });
    }

    validate_origins(&config.security.allowed_origins)?;

    Ok(())
}

/// Validate that all CORS origins are absolute http(s) origins
fn validate_origins(origins: &[String]) -> Result<(), ConfigError> {
    for origin in origins {
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ConfigError::Invalid {
                message: format!(
                    "security.allowed_origins entries must start with http:// or https://, got: {}",
                    origin
                ),
            });
        }
    }
    Ok(())
}
