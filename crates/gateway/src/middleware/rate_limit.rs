//! Rate limiting middleware.
//!
//! Fixed-window counters per client IP, held in process memory.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use common::{AppError, RateLimitConfig};

use crate::state::AppState;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u64,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Time until the current window closes
    pub reset_after: Duration,
}

/// In-memory fixed-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn window_length(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// Count a request from `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let length = self.window_length();
        let mut windows = self.lock();

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= length {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let allowed = window.count < self.config.max_requests;
        if allowed {
            window.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_after: length.saturating_sub(now.duration_since(window.started)),
        }
    }

    /// Drop windows that have closed. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let length = self.window_length();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, window| now.duration_since(window.started) < length);
        before - windows.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Rate limit middleware for all API endpoints.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), connect_info, state.config.trust_proxy_headers);
    enforce(&state.rate_limiter, ip, request, next).await
}

/// Rate limit middleware for auth endpoints (stricter).
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), connect_info, state.config.trust_proxy_headers);
    enforce(&state.auth_rate_limiter, ip, request, next).await
}

async fn enforce(
    limiter: &RateLimiter,
    ip: String,
    request: Request<Body>,
    next: Next,
) -> Response {
    let decision = limiter.check(&ip);

    if !decision.allowed {
        tracing::warn!(client = %ip, "Rate limit exceeded");
        let mut response = AppError::TooManyRequests.into_response();
        let headers = response.headers_mut();
        set_limit_headers(headers, &decision);
        return response;
    }

    let mut response = next.run(request).await;
    set_limit_headers(response.headers_mut(), &decision);
    response
}

fn retry_after_secs(decision: &RateLimitDecision) -> u64 {
    let secs = decision.reset_after.as_secs();
    if decision.reset_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Limiters nest (auth inside global), so headers already set by the inner
/// limiter are kept.
fn set_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    let reset = retry_after_secs(decision);
    if !decision.allowed {
        headers.entry(RETRY_AFTER).or_insert(HeaderValue::from(reset));
    }
    headers
        .entry(X_RATELIMIT_LIMIT)
        .or_insert(HeaderValue::from(decision.limit));
    headers
        .entry(X_RATELIMIT_REMAINING)
        .or_insert(HeaderValue::from(decision.remaining));
    headers
        .entry(X_RATELIMIT_RESET)
        .or_insert(HeaderValue::from(reset));
}

fn client_ip(
    headers: &HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        proxied_ip(headers).unwrap_or_else(|| peer_ip(connect_info))
    } else {
        peer_ip(connect_info)
    }
}

fn proxied_ip(headers: &HeaderMap) -> Option<String> {
    // Try X-Forwarded-For header first
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn peer_ip(connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::new(3, 60));
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check_at("1.2.3.4", now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = limiter.check_at("1.2.3.4", now);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_clients_counted_separately() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, 60));
        let now = Instant::now();

        assert!(limiter.check_at("a", now).allowed);
        assert!(limiter.check_at("b", now).allowed);
        assert!(!limiter.check_at("a", now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, 60));
        let now = Instant::now();

        assert!(limiter.check_at("a", now).allowed);
        assert!(!limiter.check_at("a", now + Duration::from_secs(59)).allowed);
        assert!(limiter.check_at("a", now + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn test_reset_after_counts_down() {
        let limiter = RateLimiter::new(RateLimitConfig::new(5, 60));
        let now = Instant::now();
        limiter.check_at("a", now);

        let decision = limiter.check_at("a", now + Duration::from_secs(20));
        assert_eq!(decision.reset_after, Duration::from_secs(40));
        assert_eq!(retry_after_secs(&decision), 40);
    }

    #[test]
    fn test_purge_drops_closed_windows() {
        let limiter = RateLimiter::new(RateLimitConfig::new(5, 60));
        let now = Instant::now();
        limiter.check_at("old", now);
        limiter.check_at("new", now + Duration::from_secs(30));

        assert_eq!(limiter.purge_expired_at(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_client_ip_precedence_behind_proxy() {
        let mut headers = HeaderMap::new();
        let socket: SocketAddr = "10.0.0.9:4000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(ConnectInfo(socket)), true), "10.0.0.9");
        assert_eq!(client_ip(&headers, None, true), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(client_ip(&headers, Some(ConnectInfo(socket)), true), "5.6.7.8");

        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 9.9.9.9"));
        assert_eq!(client_ip(&headers, Some(ConnectInfo(socket)), true), "1.2.3.4");
    }

    #[test]
    fn test_forwarding_headers_ignored_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        headers.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        let socket: SocketAddr = "10.0.0.9:4000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(ConnectInfo(socket)), false), "10.0.0.9");
        assert_eq!(client_ip(&headers, None, false), "unknown");
    }

    #[test]
    fn test_inner_limit_headers_kept() {
        let strict = RateLimiter::new(RateLimitConfig::new(1, 60));
        let global = RateLimiter::new(RateLimitConfig::new(100, 60));
        let now = Instant::now();
        let mut headers = HeaderMap::new();

        strict.check_at("a", now);
        set_limit_headers(&mut headers, &strict.check_at("a", now));
        set_limit_headers(&mut headers, &global.check_at("a", now));

        assert_eq!(headers[X_RATELIMIT_LIMIT], "1");
        assert_eq!(headers[X_RATELIMIT_REMAINING], "0");
        assert_eq!(headers[RETRY_AFTER], "60");
    }
}
