use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use bookshelf_core::{Book, BookChanges, BookId, NewBook, parse_id, today_utc};
use bookshelf_storage::{PageRequest, PagedResult, StorageStats};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::server::AppState;
use crate::validation::{validate_book_changes, validate_new_book, validate_page_request};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query string of `GET /api/v1/books`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub desc: Option<bool>,
}

impl From<ListBooksQuery> for PageRequest {
    fn from(q: ListBooksQuery) -> Self {
        PageRequest {
            page: q.page.unwrap_or(DEFAULT_PAGE),
            page_size: q.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            search: q.search,
            sort_by: q.sort_by,
            descending: q.desc.unwrap_or(false),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
    pub books: usize,
    pub cache: CacheStats,
    pub storage: StorageStats,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let books = state.service.count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.service.backend_name(),
        books,
        cache: state.service.cache_stats(),
        storage: state.storage.stats(),
    }))
}

// ---- Books ----

pub async fn list_books(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListBooksQuery>,
) -> Result<Json<PagedResult>, ApiError> {
    let request = PageRequest::from(query);
    validate_page_request(&request)?;
    let result = state.service.get_paged(&request).await?;
    Ok(Json(result))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_id(&id)?;
    state
        .service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn create_book(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewBook>,
) -> Result<impl IntoResponse, ApiError> {
    validate_new_book(&input, today_utc())?;
    let book = state.service.create(input).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/books/{}", book.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<BookChanges>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_id(&id)?;
    validate_book_changes(&changes, today_utc())?;
    state
        .service
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.service.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: BookId) -> ApiError {
    ApiError::not_found(format!("book {id}"))
}

