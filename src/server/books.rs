//! `/books/` handlers

use crate::access_control::{BookOperation, require};
use crate::auth::CurrentIdentity;
use crate::books::{Book, Page, PageRequest, WriteMode, current_year, service};
use crate::error::{ApiError, ApiResult};
use crate::server::{AppState, parse_id};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

const LIST_PATH: &str = "/books/";

/// Raw listing parameters; parsed after the guard so bad values never leak
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub author_id: Option<String>,
    pub publication_year: Option<String>,
    pub page: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Page<Book>>> {
    require(identity.identity(), BookOperation::List)?;
    let Query(params) = query?;

    let filter = service::parse_filter(
        params.author_id.as_deref(),
        params.publication_year.as_deref(),
    )?;
    let page = PageRequest::parse(params.page.as_deref(), state.config.api.page_size)
        .map_err(|_| ApiError::InvalidPage)?;

    let mut conn = state.store.acquire().await?;
    let page = service::list_books(&mut conn, &filter, page, LIST_PATH).await?;
    Ok(Json(page))
}

pub async fn retrieve(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    require(identity.identity(), BookOperation::Retrieve)?;
    let id = parse_id(&id, "book")?;

    let mut conn = state.store.acquire().await?;
    Ok(Json(service::get_book(&mut conn, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    require(identity.identity(), BookOperation::Create)?;
    let Json(payload) = body?;

    let mut conn = state.store.acquire().await?;
    let book = service::create_book(&mut conn, &payload, current_year()).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update(
    state: State<AppState>,
    identity: CurrentIdentity,
    id: Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    write(state, identity, id, body, BookOperation::Update).await
}

pub async fn partial_update(
    state: State<AppState>,
    identity: CurrentIdentity,
    id: Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    write(state, identity, id, body, BookOperation::PartialUpdate).await
}

async fn write(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
    operation: BookOperation,
) -> ApiResult<Json<Book>> {
    require(identity.identity(), operation)?;
    let id = parse_id(&id, "book")?;
    let Json(payload) = body?;

    let mode = match operation {
        BookOperation::PartialUpdate => WriteMode::Partial,
        _ => WriteMode::Full,
    };

    let mut conn = state.store.acquire().await?;
    let book = service::update_book(&mut conn, id, &payload, mode, current_year()).await?;
    Ok(Json(book))
}

pub async fn destroy(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require(identity.identity(), BookOperation::Delete)?;
    let id = parse_id(&id, "book")?;

    let mut conn = state.store.acquire().await?;
    service::delete_book(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
