//! `POST /api-token-auth/`
//!
//! Exchanges an email and password for the identity's API token.

use crate::auth::manager::{authenticate, obtain_token as token_for};
use crate::error::{ApiResult, FieldErrors};
use crate::server::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};
use tracing::info;

pub async fn obtain_token(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = body?;
    let (username, password) = credentials(&payload)?;

    let mut conn = state.store.acquire().await?;
    let identity = authenticate(&mut conn, username, password, state.pepper()).await?;
    let token = token_for(&mut conn, identity.id).await?;

    info!(identity = %identity.email, "Issued API token");
    Ok(Json(json!({ "token": token })))
}

fn credentials(payload: &Value) -> Result<(&str, &str), FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = string_field(payload, "username", &mut errors);
    let password = string_field(payload, "password", &mut errors);

    match (username, password) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(errors),
    }
}

fn string_field<'a>(payload: &'a Value, name: &str, errors: &mut FieldErrors) -> Option<&'a str> {
    match payload.get(name) {
        Some(Value::String(value)) if !value.is_empty() => Some(value.as_str()),
        Some(Value::String(_)) => {
            errors.add(name, "This field may not be blank.");
            None
        }
        Some(Value::Null) | None => {
            errors.add(name, "This field is required.");
            None
        }
        Some(_) => {
            errors.add(name, "Not a valid string.");
            None
        }
    }
}
