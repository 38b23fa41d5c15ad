//! Torrent upload, retrieval, deletion, download, and swarm handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use undertow_core::TorrentRecord;
use undertow_search::TorrentDocument;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role, bearer_token};
use crate::error::ApiError;
use crate::server::AppState;

pub(crate) async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, ApiError> {
    let token = bearer_token(headers)?;
    Ok(state.roles.verify(token).await?)
}

fn record_view(record: &TorrentRecord) -> serde_json::Value {
    json!({
        "torrent_id": record.id,
        "info_hash": record.info_hash,
        "filename": record.filename,
        "description": record.description,
        "uploader": record.uploader,
        "file_size": record.file_size,
        "piece_length": record.piece_length,
        "pieces_count": record.piece_count(),
        "files": record.files,
        "seeders": record.seeders,
        "leechers": record.leechers,
        "completed": record.completed,
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    })
}

/// `POST /torrents` - multipart upload of a `.torrent` file.
///
/// Requires the admin or uploader role. The record is stored first; indexing
/// is best-effort and an index failure is reported as `indexed: false`
/// without unwinding the stored record.
pub async fn upload_torrent(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &headers).await?;
    user.require_any(&[Role::Admin, Role::Uploader])?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| ApiError::bad_request("file part has no filename"))?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read description: {e}")))?;
                if !text.is_empty() {
                    description = Some(text);
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| ApiError::bad_request("missing 'file' part"))?;
    if !filename.ends_with(".torrent") {
        return Err(ApiError::bad_request("file must have a .torrent extension"));
    }

    let record = state
        .catalog
        .add_torrent(&bytes, description, user.username)
        .await?;

    let indexed = match state.search.upsert(TorrentDocument::from(&record)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(id = %record.id, info_hash = %record.info_hash, "indexing failed: {e}");
            false
        }
    };

    let body = json!({
        "torrent_id": record.id,
        "info_hash": record.info_hash,
        "filename": record.filename,
        "file_size": record.file_size,
        "pieces_count": record.piece_count(),
        "indexed": indexed,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// `GET /torrents/{id}` - full record view.
pub async fn torrent_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authenticate(&state, &headers).await?;
    let record = state.catalog.torrent(id).await?;
    Ok(Json(record_view(&record)))
}

/// `DELETE /torrents/{id}` - removes the index entry, then the record.
///
/// Admin only. The index is cleared first so a half-finished delete leaves a
/// stored record without a stale search hit rather than the reverse.
pub async fn delete_torrent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    user.require_any(&[Role::Admin])?;

    // 404 before touching the index.
    state.catalog.torrent(id).await?;
    state.search.delete(id).await?;
    let record = state.catalog.remove(id).await?;

    Ok(Json(json!({
        "torrent_id": record.id,
        "filename": record.filename,
        "deleted": true,
    })))
}

/// `GET /torrents/{id}/download` - reconstructed `.torrent` stream.
pub async fn download_torrent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers).await?;
    let (record, bytes) = state.catalog.torrent_file(id).await?;

    let disposition = format!("attachment; filename=\"{}.torrent\"", record.filename);
    let response_headers = [
        (header::CONTENT_TYPE, "application/x-bencoded".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((response_headers, bytes).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SwarmUpdate {
    pub seeders: u32,
    pub leechers: u32,
    pub completed: Option<u32>,
}

/// `PUT /torrents/{id}/swarm` - applies externally tracked swarm counters.
///
/// Admin only; intended for an out-of-band tracker scraper. Updates the
/// record and the search projection together.
pub async fn update_swarm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(update): Json<SwarmUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    user.require_any(&[Role::Admin])?;

    let record = state
        .catalog
        .update_swarm(id, update.seeders, update.leechers, update.completed)
        .await?;
    state
        .search
        .update_swarm(id, update.seeders, update.leechers, update.completed)
        .await?;

    Ok(Json(record_view(&record)))
}
