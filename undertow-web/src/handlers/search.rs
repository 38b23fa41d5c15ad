//! Search handler.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::handlers::torrents::authenticate;
use crate::server::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

/// `GET /search?q=<query>&limit=<n>` - field-weighted search over the index.
///
/// The query must be at least two characters; `limit` is capped at 200.
pub async fn search_torrents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authenticate(&state, &headers).await?;

    let query = params.q.trim();
    // Counted in characters, not bytes, so "é" is still one character.
    if query.chars().count() < 2 {
        return Err(ApiError::bad_request(
            "query must be at least 2 characters",
        ));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let results = state.search.search(query, limit).await?;
    Ok(Json(json!({
        "query": query,
        "count": results.len(),
        "results": results,
    })))
}
