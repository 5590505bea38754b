//! # Handlers
//!
//! This module coordinates the flow between HTTP requests and the content service.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use domains::{Category, RequestContext, SymbolInput, SymbolQuery, SymbolView};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::REQUEST_ID_HEADER;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Builds the per-request context from headers and the duplication marker.
fn request_context(headers: &HeaderMap, old_id: Option<i64>) -> RequestContext {
    let ctx = RequestContext::new(old_id);
    match headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
    {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

// ── Symbols ─────────────────────────────────────────────────────────────────

pub async fn list_symbols(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state.content.list_symbols(&query).await?;
    let (per_page, _) = query.limit_offset();
    let total_pages = (page.total + per_page - 1) / per_page;

    let mut headers = HeaderMap::new();
    headers.insert("x-total-count", HeaderValue::from(page.total));
    headers.insert("x-total-pages", HeaderValue::from(total_pages));
    Ok((headers, Json(page.items)))
}

pub async fn create_symbol(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SymbolInput>,
) -> ApiResult<impl IntoResponse> {
    let ctx = request_context(&headers, input.old_id);
    let view = state.content.create_symbol(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_symbol(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<SymbolView>> {
    Ok(Json(state.content.get_symbol(id).await?))
}

pub async fn update_symbol(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(input): Json<SymbolInput>,
) -> ApiResult<Json<SymbolView>> {
    let ctx = request_context(&headers, input.old_id);
    Ok(Json(state.content.update_symbol(&ctx, id, input).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub force: bool,
}

pub async fn delete_symbol(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Json<SymbolView>> {
    Ok(Json(state.content.delete_symbol(id, params.force).await?))
}

pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<SymbolView>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Ok(Json(state.content.upload_thumbnail(id, content_type, body.to_vec()).await?))
}

// ── Categories ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.content.list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<NewCategory>,
) -> ApiResult<impl IntoResponse> {
    let category = state.content.create_category(&body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Category>> {
    Ok(Json(state.content.get_category(id).await?))
}

pub async fn delete_category(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Category>> {
    Ok(Json(state.content.delete_category(id).await?))
}

pub async fn health() -> &'static str {
    "ok"
}
