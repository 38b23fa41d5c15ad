//! API error taxonomy and HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use undertow_core::TorrentError;
use undertow_search::SearchError;

/// Errors surfaced by API handlers.
///
/// Each variant maps to exactly one HTTP status; the response body is always
/// `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {reason}")]
    BadRequest { reason: String },

    #[error("Missing or invalid credentials")]
    Unauthorized,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Torrent not found")]
    NotFound,

    #[error("Torrent already exists: {info_hash}")]
    Duplicate { info_hash: String },

    #[error("Rate limit exceeded, try again later")]
    RateLimited,

    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl ApiError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Duplicate { .. } => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<TorrentError> for ApiError {
    fn from(error: TorrentError) -> Self {
        match error {
            TorrentError::Decode(e) => ApiError::bad_request(format!("malformed torrent: {e}")),
            TorrentError::InvalidMetadata { reason } => {
                ApiError::bad_request(format!("invalid torrent: {reason}"))
            }
            TorrentError::Duplicate { info_hash } => ApiError::Duplicate {
                info_hash: info_hash.to_string(),
            },
            TorrentError::RecordNotFound { .. } => ApiError::NotFound,
            TorrentError::CorruptRecord { reason } => ApiError::Internal { reason },
            TorrentError::Storage(e) => ApiError::Internal {
                reason: e.to_string(),
            },
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        ApiError::Internal {
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use undertow_core::InfoHash;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Duplicate {
                info_hash: "ab".repeat(20)
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_duplicate_torrent_maps_to_conflict() {
        let info_hash = InfoHash::from_hex(&"ab".repeat(20)).unwrap();
        let api: ApiError = TorrentError::Duplicate { info_hash }.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_record_maps_to_not_found() {
        let api: ApiError = TorrentError::RecordNotFound {
            id: uuid::Uuid::new_v4(),
        }
        .into();
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
    }
}
