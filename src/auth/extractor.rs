//! Request identity extraction
//!
//! Resolves the `Authorization` header to an [`Identity`] before handlers run.
//! A missing header yields an anonymous request; the guard then decides
//! whether anonymous access is enough.

use crate::auth::manager::identity_for_token;
use crate::auth::token::parse_authorization;
use crate::auth::Identity;
use crate::error::{ApiError, AuthError};
use crate::server::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

/// The caller's identity, or `None` for anonymous requests
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

impl CurrentIdentity {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(CurrentIdentity(None));
        };

        let header = header.to_str().map_err(|_| ApiError::invalid_token())?;
        let Some(key) = parse_authorization(header)? else {
            return Ok(CurrentIdentity(None));
        };

        let mut conn = state.store.acquire().await?;
        match identity_for_token(&mut conn, key).await {
            Ok(identity) => {
                debug!(identity = %identity.email, "Authenticated request");
                Ok(CurrentIdentity(Some(identity)))
            }
            Err(AuthError::InvalidToken) => Err(ApiError::invalid_token()),
            Err(e) => Err(e.into()),
        }
    }
}
