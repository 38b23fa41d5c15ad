//! HTTP API layer for the torrent catalog.
//!
//! Exposes upload, search, retrieval, deletion, download, and swarm-update
//! endpoints over axum, with bearer-token role gating and per-client rate
//! limiting in front of every route.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod server;

pub use auth::{AuthenticatedUser, RemoteRoleProvider, Role, RoleProvider, StaticTokenProvider};
pub use error::ApiError;
pub use rate_limit::SlidingWindowLimiter;
pub use server::{AppState, router, run_server};
