//! `/authors/` handlers
//!
//! Reading authors needs `can_view_book`; adding one needs `can_create_book`.

use crate::access_control::{Permission, resolver::require_permission};
use crate::auth::CurrentIdentity;
use crate::books::{Author, AuthorWithBooks, service};
use crate::error::ApiResult;
use crate::server::{AppState, parse_id};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

pub async fn list(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> ApiResult<Json<Vec<AuthorWithBooks>>> {
    require_permission(identity.identity(), Permission::ViewBook, "list_authors")?;

    let mut conn = state.store.acquire().await?;
    Ok(Json(service::list_authors(&mut conn).await?))
}

pub async fn retrieve(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<AuthorWithBooks>> {
    require_permission(identity.identity(), Permission::ViewBook, "retrieve_author")?;
    let id = parse_id(&id, "author")?;

    let mut conn = state.store.acquire().await?;
    Ok(Json(service::get_author(&mut conn, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Author>)> {
    require_permission(identity.identity(), Permission::CreateBook, "create_author")?;
    let Json(payload) = body?;

    let mut conn = state.store.acquire().await?;
    let author = service::create_author(&mut conn, &payload).await?;
    Ok((StatusCode::CREATED, Json(author)))
}
