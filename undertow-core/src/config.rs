//! Centralized configuration for Undertow.
//!
//! All tunable parameters live here to avoid hard-coded values scattered
//! throughout the codebase. Supports environment variable overrides for
//! runtime customization.

use std::time::Duration;

/// Central configuration for all Undertow components.
#[derive(Debug, Clone, Default)]
pub struct UndertowConfig {
    pub tracker: TrackerConfig,
    pub http: HttpConfig,
    pub limits: RateLimitConfig,
}

/// Settings for reconstructed `.torrent` output.
///
/// The announce URL and `created by` string are synthesized into every
/// downloaded torrent; they are not taken from the original upload.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Announce URL written into reconstructed torrents
    pub announce_url: String,
    /// `created by` identifier written into reconstructed torrents
    pub created_by: &'static str,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            announce_url: "http://localhost/announce".to_string(),
            created_by: "undertow",
        }
    }
}

/// HTTP server binding configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address and port the API server binds to
    pub bind_addr: String,
    /// OIDC userinfo endpoint for bearer-token verification (None = static
    /// development tokens)
    pub userinfo_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            userinfo_url: None,
        }
    }
}

/// Sliding-window rate limiting applied before any handler runs.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per client within the window
    pub max_requests: usize,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl UndertowConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(announce) = std::env::var("UNDERTOW_ANNOUNCE_URL") {
            config.tracker.announce_url = announce;
        }

        if let Ok(bind_addr) = std::env::var("UNDERTOW_BIND_ADDR") {
            config.http.bind_addr = bind_addr;
        }

        if let Ok(userinfo) = std::env::var("UNDERTOW_USERINFO_URL") {
            config.http.userinfo_url = Some(userinfo);
        }

        if let Ok(limit) = std::env::var("UNDERTOW_RATE_LIMIT") {
            if let Ok(count) = limit.parse::<usize>() {
                config.limits.max_requests = count;
            }
        }

        if let Ok(window) = std::env::var("UNDERTOW_RATE_WINDOW_SECS") {
            if let Ok(seconds) = window.parse::<u64>() {
                config.limits.window = Duration::from_secs(seconds);
            }
        }

        config
    }

    /// Creates a configuration suited to tests: no remote identity provider
    /// and a rate limit high enough to never trip.
    pub fn for_testing() -> Self {
        Self {
            limits: RateLimitConfig {
                max_requests: 10_000,
                window: Duration::from_secs(60),
            },
            ..Default::default()
        }
    }
}
