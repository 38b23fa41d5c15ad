//! In-process HTTP API tests: the full router with real state, exercised
//! through tower without binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;
use undertow_core::config::{RateLimitConfig, TrackerConfig, UndertowConfig};
use undertow_core::storage::InMemoryTorrentStore;
use undertow_core::TorrentCatalog;
use undertow_search::InMemorySearchIndex;
use undertow_web::{AppState, Role, SlidingWindowLimiter, StaticTokenProvider, router};

const SINGLE_FILE: &[u8] =
    b"d4:infod6:lengthi1024e4:name4:a.js12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";

const BOUNDARY: &str = "test-boundary";

fn test_router() -> Router {
    let config = UndertowConfig::for_testing();
    build_router(config.tracker, config.limits)
}

fn router_with_limit(max_requests: usize) -> Router {
    let config = UndertowConfig::for_testing();
    build_router(
        config.tracker,
        RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        },
    )
}

fn build_router(tracker: TrackerConfig, limits: RateLimitConfig) -> Router {
    let catalog = TorrentCatalog::new(Arc::new(InMemoryTorrentStore::new()), tracker);
    let roles = StaticTokenProvider::new()
        .with_token("admin-token", "alice", &[Role::Admin, Role::Uploader])
        .with_token("uploader-token", "bob", &[Role::Uploader])
        .with_token("normal-token", "carol", &[Role::Normal]);
    let limiter = SlidingWindowLimiter::new(&limits);

    router(AppState {
        catalog,
        search: Arc::new(InMemorySearchIndex::new()),
        roles: Arc::new(roles),
        limiter: Arc::new(limiter),
    })
}

fn multipart_body(filename: &str, content: &[u8], description: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(description) = description {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"description\"\r\n\r\n");
        body.extend_from_slice(description.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/torrents")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            filename,
            content,
            Some("a tiny script"),
        )))
        .unwrap()
}

fn get_request(token: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_search_download_workflow() {
    let app = test_router();

    let response = app
        .clone()
        .oneshot(upload_request("uploader-token", "a.torrent", SINGLE_FILE))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "a.js");
    assert_eq!(body["file_size"], 1024);
    assert_eq!(body["pieces_count"], 1);
    assert_eq!(body["indexed"], true);
    let id = body["torrent_id"].as_str().unwrap().to_string();
    let info_hash = body["info_hash"].as_str().unwrap().to_string();
    assert_eq!(info_hash.len(), 40);

    // Any authenticated role can read details.
    let response = app
        .clone()
        .oneshot(get_request("normal-token", &format!("/torrents/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let details = json_body(response).await;
    assert_eq!(details["uploader"], "bob");
    assert_eq!(details["seeders"], 0);

    // The upload is searchable by filename.
    let response = app
        .clone()
        .oneshot(get_request("normal-token", "/search?q=a.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let results = json_body(response).await;
    assert_eq!(results["count"], 1);
    assert_eq!(results["results"][0]["info_hash"], info_hash.as_str());

    // Download returns a bencoded attachment named after the torrent.
    let response = app
        .clone()
        .oneshot(get_request(
            "normal-token",
            &format!("/torrents/{id}/download"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-bencoded"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a.js.torrent\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"d8:announce"));
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = test_router();
    let request = Request::builder()
        .method("POST")
        .uri("/torrents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("a.torrent", SINGLE_FILE, None)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_requires_uploader_role() {
    let app = test_router();
    let response = app
        .oneshot(upload_request("normal-token", "a.torrent", SINGLE_FILE))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension() {
    let app = test_router();
    let response = app
        .oneshot(upload_request("uploader-token", "a.txt", SINGLE_FILE))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_malformed_torrent() {
    let app = test_router();
    let response = app
        .oneshot(upload_request("uploader-token", "a.torrent", b"garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn test_duplicate_upload_is_conflict() {
    let app = test_router();
    let first = app
        .clone()
        .oneshot(upload_request("uploader-token", "a.torrent", SINGLE_FILE))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(upload_request("admin-token", "a.torrent", SINGLE_FILE))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_is_admin_only_and_clears_index() {
    let app = test_router();
    let response = app
        .clone()
        .oneshot(upload_request("uploader-token", "a.torrent", SINGLE_FILE))
        .await
        .unwrap();
    let id = json_body(response).await["torrent_id"]
        .as_str()
        .unwrap()
        .to_string();

    let forbidden = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/torrents/{id}"))
                .header(header::AUTHORIZATION, "Bearer uploader-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/torrents/{id}"))
                .header(header::AUTHORIZATION, "Bearer admin-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    let body = json_body(deleted).await;
    assert_eq!(body["filename"], "a.js");
    assert_eq!(body["deleted"], true);

    let gone = app
        .clone()
        .oneshot(get_request("normal-token", &format!("/torrents/{id}")))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let search = app
        .oneshot(get_request("normal-token", "/search?q=a.js"))
        .await
        .unwrap();
    assert_eq!(json_body(search).await["count"], 0);
}

#[tokio::test]
async fn test_search_rejects_short_query() {
    let app = test_router();
    let response = app
        .clone()
        .oneshot(get_request("normal-token", "/search?q=a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // One multibyte character is still one character.
    let response = app
        .oneshot(get_request("normal-token", "/search?q=%C3%A9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_torrent_is_not_found() {
    let app = test_router();
    let response = app
        .oneshot(get_request(
            "normal-token",
            &format!("/torrents/{}", uuid::Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swarm_update_reflected_in_record_and_search() {
    let app = test_router();
    let response = app
        .clone()
        .oneshot(upload_request("uploader-token", "a.torrent", SINGLE_FILE))
        .await
        .unwrap();
    let id = json_body(response).await["torrent_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/torrents/{id}/swarm"))
                .header(header::AUTHORIZATION, "Bearer admin-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"seeders": 7, "leechers": 2, "completed": 40}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["seeders"], 7);
    assert_eq!(body["leechers"], 2);
    assert_eq!(body["completed"], 40);

    let search = app
        .oneshot(get_request("normal-token", "/search?q=a.js"))
        .await
        .unwrap();
    let results = json_body(search).await;
    assert_eq!(results["results"][0]["seeders"], 7);
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let app = router_with_limit(2);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_request("normal-token", "/search?q=anything"))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = app
        .oneshot(get_request("normal-token", "/search?q=anything"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
