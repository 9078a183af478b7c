//! Per-IP rate limiting for the public auth routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Login, register, google-login, forgot-password
const STRICT_MAX: u32 = 5;
/// Reset-password
const MODERATE_MAX: u32 = 10;
const WINDOW_SECS: u64 = 60;
/// Entries idle longer than this are dropped by `cleanup`
const IDLE_SECS: u64 = 300;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, route: &'static str, ip: &str, max_requests: u32, window_secs: u64) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Drop idle entries; returns how many IP entries remain
    pub async fn cleanup(&self) -> usize {
        let mut map = self.inner.lock().await;
        let cutoff = std::time::Duration::from_secs(IDLE_SECS);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }
        map.retain(|_, route_map| !route_map.is_empty());
        map.values().map(HashMap::len).sum()
    }
}

/// Client IP: first X-Forwarded-For entry, then the peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

fn too_many_requests() -> Response {
    AppError::with_message(ErrorCode::TooManyRequests, "Too many requests, try again later")
        .into_response()
}

async fn limit(
    state: &AppState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(route, &ip, max_requests, WINDOW_SECS).await {
        tracing::warn!(ip = %ip, route, "Rate limited");
        return too_many_requests();
    }
    next.run(request).await
}

/// Bucket name for a credential route
fn route_key(path: &str) -> &'static str {
    match path.rsplit('/').next().unwrap_or_default() {
        "login" => "login",
        "register" => "register",
        "google-login" => "google_login",
        "forgot-password" => "forgot_password",
        _ => "auth",
    }
}

/// 5 requests / 60 s per IP and route
pub async fn strict_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let route = route_key(request.uri().path());
    limit(&state, route, STRICT_MAX, request, next).await
}

/// 10 requests / 60 s per IP
pub async fn moderate_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    limit(&state, "reset_password", MODERATE_MAX, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_ip_and_route() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("login", "10.0.0.1", 3, 60).await);
        }
        assert!(!limiter.check("login", "10.0.0.1", 3, 60).await);
        assert!(limiter.check("login", "10.0.0.2", 3, 60).await);
        assert!(limiter.check("register", "10.0.0.1", 3, 60).await);
    }

    #[test]
    fn test_route_key() {
        assert_eq!(route_key("/api/auth/login"), "login");
        assert_eq!(route_key("/api/auth/google-login"), "google_login");
        assert_eq!(route_key("/api/auth/other"), "auth");
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("login", "ip", 1, 0).await);
        assert!(limiter.check("login", "ip", 1, 0).await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "ip", 5, 60).await;
        assert_eq!(limiter.cleanup().await, 1);
    }
}
