//! Response security headers and CORS

use crate::config::SecurityConfig;
use crate::error::ConfigError;
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

/// Attach the configured security headers, plus CORS when origins are listed
pub fn apply(router: Router, config: &SecurityConfig) -> Result<Router, ConfigError> {
    let headers = [
        (
            header::CONTENT_SECURITY_POLICY,
            header_value("content_security_policy", &config.content_security_policy)?,
        ),
        (
            header::X_FRAME_OPTIONS,
            header_value("frame_options", &config.frame_options)?,
        ),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (
            header::REFERRER_POLICY,
            header_value("referrer_policy", &config.referrer_policy)?,
        ),
    ];

    let mut router = router;
    for (name, value) in headers {
        router = router.layer(overriding(name, value));
    }

    if config.allowed_origins.is_empty() {
        return Ok(router);
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| header_value("allowed_origins", origin))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(origins = ?config.allowed_origins, "Enabling CORS");

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Ok(router.layer(cors))
}

fn overriding(name: HeaderName, value: HeaderValue) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, value)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::Invalid {
        message: format!("security.{field} is not a valid header value: {value:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unprintable_header_values() {
        let config = SecurityConfig {
            frame_options: "DENY\nX-Injected: 1".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            apply(Router::new(), &config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_default_config_applies() {
        assert!(apply(Router::new(), &SecurityConfig::default()).is_ok());
    }
}
