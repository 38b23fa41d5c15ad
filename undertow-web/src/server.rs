//! JSON API server assembly.
//!
//! Builds the router from shared application state and serves it. All
//! collaborators sit behind trait objects so the catalog, index, and
//! identity provider can be swapped without touching handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use undertow_core::config::UndertowConfig;
use undertow_core::storage::InMemoryTorrentStore;
use undertow_core::{TorrentCatalog, UndertowError};
use undertow_search::{InMemorySearchIndex, SearchIndex};

use crate::auth::{RemoteRoleProvider, Role, RoleProvider, StaticTokenProvider};
use crate::handlers::{
    delete_torrent, download_torrent, search_torrents, torrent_details, update_swarm,
    upload_torrent,
};
use crate::rate_limit::{SlidingWindowLimiter, enforce_rate_limit};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: TorrentCatalog,
    pub search: Arc<dyn SearchIndex>,
    pub roles: Arc<dyn RoleProvider>,
    pub limiter: Arc<SlidingWindowLimiter>,
}

/// Builds the API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/torrents", post(upload_torrent))
        .route("/torrents/{id}", get(torrent_details).delete(delete_torrent))
        .route("/torrents/{id}/download", get(download_torrent))
        .route("/torrents/{id}/swarm", put(update_swarm))
        .route("/search", get(search_torrents))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the server with in-memory storage and search.
///
/// Without `UNDERTOW_USERINFO_URL` the server falls back to a static
/// development token (`dev-admin`) holding every role.
///
/// # Errors
///
/// - `UndertowError::Io` - The bind address is unavailable
pub async fn run_server(config: UndertowConfig) -> Result<(), UndertowError> {
    let store = Arc::new(InMemoryTorrentStore::new());
    let catalog = TorrentCatalog::new(store, config.tracker.clone());
    let search: Arc<dyn SearchIndex> = Arc::new(InMemorySearchIndex::new());

    let roles: Arc<dyn RoleProvider> = match &config.http.userinfo_url {
        Some(url) => Arc::new(RemoteRoleProvider::new(url.clone())),
        None => Arc::new(StaticTokenProvider::new().with_token(
            "dev-admin",
            "admin",
            &[Role::Admin, Role::Uploader, Role::Normal],
        )),
    };

    let state = AppState {
        catalog,
        search,
        roles,
        limiter: Arc::new(SlidingWindowLimiter::new(&config.limits)),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.http.bind_addr).await?;
    tracing::info!("listening on http://{}", config.http.bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
