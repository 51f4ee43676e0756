//! HTTP error mapping.
//!
//! Maps request-time errors to HTTP responses with stable JSON bodies.
//!
//! # Strategy
//! - Guard rejections → 401 / 403 with a `detail` message
//! - Field validation → 400 with `{"field": ["reason", ...]}`
//! - Missing rows → 404
//! - Data-store failures → 500; the cause is logged, never returned

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, info};

use super::ApiError;

/// Status code for an [`ApiError`]
pub fn status_for(error: &ApiError) -> StatusCode {
    match error {
        ApiError::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
        ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ApiError::Validation(_) | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        ApiError::NotFound(_) | ApiError::InvalidPage => StatusCode::NOT_FOUND,
        ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body for an [`ApiError`]
pub fn body_for(error: &ApiError) -> Value {
    match error {
        ApiError::AuthenticationRequired(detail) => json!({ "detail": detail }),
        ApiError::PermissionDenied(_) => {
            json!({ "detail": "You do not have permission to perform this action." })
        }
        ApiError::Validation(errors) => json!(errors),
        ApiError::MalformedRequest(message) => json!({ "detail": message }),
        ApiError::NotFound(_) => json!({ "detail": "Not found." }),
        ApiError::InvalidPage => json!({ "detail": "Invalid page." }),
        ApiError::Internal(_) => json!({ "detail": "Internal server error." }),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(cause) => error!(error = %cause, "Request failed"),
            ApiError::PermissionDenied(denied) => info!(
                operation = %denied.operation,
                missing = %denied.missing,
                "Permission denied"
            ),
            _ => {}
        }

        let status = status_for(&self);
        let mut response = (status, Json(body_for(&self))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(format!("JSON parse error - {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::Permission;
    use crate::error::{AccessDeniedError, FieldErrors};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ApiError::not_authenticated()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&ApiError::PermissionDenied(AccessDeniedError::new(
                "create_book",
                Permission::CreateBook
            ))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&ApiError::Validation(FieldErrors::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ApiError::not_found("book 9")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ApiError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bodies_do_not_leak_details() {
        let body = body_for(&ApiError::not_found("book 42"));
        assert_eq!(body, json!({ "detail": "Not found." }));

        let body = body_for(&ApiError::InvalidPage);
        assert_eq!(body, json!({ "detail": "Invalid page." }));

        let body = body_for(&ApiError::Internal("disk I/O error at /var/db".into()));
        assert_eq!(body, json!({ "detail": "Internal server error." }));

        let body = body_for(&ApiError::PermissionDenied(AccessDeniedError::new(
            "delete_book",
            Permission::DeleteBook,
        )));
        assert!(!body.to_string().contains("can_delete_book"));
    }

    #[test]
    fn test_validation_body_is_field_map() {
        let errors = FieldErrors::single("publication_year", "in the future");
        let body = body_for(&ApiError::Validation(errors));
        assert_eq!(body, json!({ "publication_year": ["in the future"] }));
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::invalid_token().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Token"
        );
    }
}
