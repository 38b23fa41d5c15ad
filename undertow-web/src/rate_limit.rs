//! Per-client sliding-window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;
use undertow_core::config::RateLimitConfig;

use crate::error::ApiError;
use crate::server::AppState;

/// Sliding-window request limiter keyed by client IP.
///
/// Each client may make `max_requests` requests per `window`; the window
/// slides, so a burst that filled it clears out gradually rather than at a
/// fixed boundary.
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    clients: Mutex<Clients>,
}

struct Clients {
    windows: HashMap<IpAddr, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl SlidingWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            clients: Mutex::new(Clients {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Records a request from `client` and reports whether it is allowed.
    ///
    /// Expired timestamps are pruned before counting, so denied requests do
    /// not extend the window.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().windows.len()
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut clients = self.clients.lock();

        // Idle clients would otherwise be retained forever; sweep the whole
        // map at most once per window, the way expiring store keys would.
        if now.duration_since(clients.last_sweep) >= self.window {
            let window = self.window;
            clients.windows.retain(|_, timestamps| {
                timestamps
                    .back()
                    .is_some_and(|newest| now.duration_since(*newest) < window)
            });
            clients.last_sweep = now;
        }

        let window = clients.windows.entry(client).or_default();
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() >= self.max_requests {
            return false;
        }
        window.push_back(now);
        true
    }
}

/// Axum middleware enforcing the limiter on every route it wraps.
///
/// The client IP comes from the connection info when the server was started
/// with `into_make_service_with_connect_info`; requests served without it
/// (in-process tests) fall back to a single shared bucket.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.limiter.check(client) {
        tracing::warn!(%client, "rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize, window: Duration) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(&RateLimitConfig {
            max_requests,
            window,
        })
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = limiter(3, Duration::from_secs(60));
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.check(client));
        assert!(limiter.check(client));
        assert!(limiter.check(client));
        assert!(!limiter.check(client));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, Duration::from_secs(60));
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, Duration::from_secs(60));
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let start = Instant::now();
        assert!(limiter.check_at(client, start));
        assert!(limiter.check_at(client, start + Duration::from_secs(30)));
        assert!(!limiter.check_at(client, start + Duration::from_secs(45)));
        // The first request ages out after a full window.
        assert!(limiter.check_at(client, start + Duration::from_secs(61)));
    }

    #[test]
    fn test_idle_clients_are_evicted() {
        let limiter = limiter(10, Duration::from_secs(1));
        let start = Instant::now();
        for i in 0..1000u32 {
            let octets = i.to_be_bytes();
            let client = IpAddr::V4(Ipv4Addr::new(10, octets[1], octets[2], octets[3]));
            assert!(limiter.check_at(client, start));
        }
        assert_eq!(limiter.tracked_clients(), 1000);

        // One request after every window expired sweeps the idle entries.
        let later = start + Duration::from_secs(5);
        assert!(limiter.check_at(IpAddr::V4(Ipv4Addr::LOCALHOST), later));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_active_clients_survive_the_sweep() {
        let limiter = limiter(10, Duration::from_secs(60));
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let start = Instant::now();
        assert!(limiter.check_at(a, start));
        assert!(limiter.check_at(b, start + Duration::from_secs(50)));

        // The sweep runs at +61s; `a` is stale by then, `b` is not.
        assert!(limiter.check_at(b, start + Duration::from_secs(61)));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_denied_requests_do_not_consume_quota() {
        let limiter = limiter(1, Duration::from_secs(60));
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let start = Instant::now();
        assert!(limiter.check_at(client, start));
        assert!(!limiter.check_at(client, start + Duration::from_secs(10)));
        // Only the allowed request counts toward the window.
        assert!(limiter.check_at(client, start + Duration::from_secs(61)));
    }
}
