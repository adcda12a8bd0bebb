//! API rate limiting middleware.
//!
//! Fixed-window counters keyed by account or client IP.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cyberguard_common::{Metrics, get_metrics};
use cyberguard_db::entities::user;
use tokio::sync::RwLock;

/// Rate limit configuration for different endpoint types.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Create a new rate limit config.
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Default rate limits for different endpoint categories.
pub mod limits {
    use super::RateLimitConfig;

    /// Filing complaints and reports.
    pub const REPORT: RateLimitConfig = RateLimitConfig::new(30, 3600);

    /// Registration, login, OTP and password recovery.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new(10, 300);
}

/// Counter for a single key.
#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: Instant,
}

impl Window {
    fn new() -> Self {
        Self {
            count: 0,
            started: Instant::now(),
        }
    }
}

/// API rate limiter.
#[derive(Clone)]
pub struct ApiRateLimiter {
    /// State per key (user ID or IP address).
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl Default for ApiRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRateLimiter {
    /// Create a new rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let length = Duration::from_secs(config.window_secs);

        let window = windows.entry(key.to_string()).or_insert_with(Window::new);

        if now.duration_since(window.started) >= length {
            window.count = 0;
            window.started = now;
        }

        let reset = length
            .saturating_sub(now.duration_since(window.started))
            .as_secs();

        if window.count >= config.max_requests {
            return RateLimitResult::Limited {
                retry_after: reset.max(1),
                limit: config.max_requests,
            };
        }

        window.count += 1;
        RateLimitResult::Allowed {
            remaining: config.max_requests.saturating_sub(window.count),
            limit: config.max_requests,
            reset,
        }
    }

    /// Drop keys whose window ended long ago.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let max_age = Duration::from_secs(max_window_secs * 2);

        windows.retain(|_, window| now.duration_since(window.started) < max_age);
    }

    /// Get the number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Rate limit check result.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        retry_after: u64,
        limit: u32,
    },
}

/// Rate limiter state for middleware.
#[derive(Clone, Default)]
pub struct RateLimiterState {
    /// Per-account limiter.
    pub user_limiter: ApiRateLimiter,
    /// Per-IP limiter for unauthenticated requests.
    pub ip_limiter: ApiRateLimiter,
    /// Key on `X-Forwarded-For`/`X-Real-IP` instead of the peer address.
    /// Only safe behind a reverse proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl RateLimiterState {
    /// Create a new rate limiter state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether forwarded headers name the client.
    #[must_use]
    pub fn with_trusted_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Prune both limiters.
    pub async fn cleanup(&self) {
        let longest = limits::AUTH.window_secs.max(limits::REPORT.window_secs);
        self.user_limiter.cleanup(longest).await;
        self.ip_limiter.cleanup(longest).await;
    }
}

/// Rate limit error response.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests, please try again later",
                "retryAfter": self.retry_after
            }
        });

        (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("Retry-After", self.retry_after.to_string()),
                ("Content-Type", "application/json".to_string()),
            ],
            body.to_string(),
        )
            .into_response()
    }
}

/// Extract client IP from proxy headers.
fn forwarded_client_ip(req: &Request<Body>) -> Option<IpAddr> {
    if let Some(xff) = req.headers().get("x-forwarded-for")
        && let Ok(xff_str) = xff.to_str()
        && let Some(first_ip) = xff_str.split(',').next()
        && let Ok(ip) = first_ip.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
}

/// The client address used as the rate limit key.
///
/// The TCP peer unless `trust_proxy` is set, in which case forwarded headers
/// win and the peer is the fallback.
fn client_ip(req: &Request<Body>, trust_proxy: bool) -> Option<IpAddr> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if trust_proxy {
        forwarded_client_ip(req).or(peer)
    } else {
        peer
    }
}

/// Rate limiting middleware for auth operations.
pub async fn rate_limit_auth_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(limiter, req, next, &limits::AUTH).await
}

/// Rate limiting middleware for report submission.
pub async fn rate_limit_report_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(limiter, req, next, &limits::REPORT).await
}

async fn rate_limit_with_config(
    limiter: RateLimiterState,
    req: Request<Body>,
    next: Next,
    config: &RateLimitConfig,
) -> Result<Response, RateLimitError> {
    let result = if let Some(user) = req.extensions().get::<user::Model>() {
        let key = format!("user:{}", user.id);
        limiter.user_limiter.check(&key, config).await
    } else {
        let key = client_ip(&req, limiter.trust_proxy)
            .map_or_else(|| "unknown".to_string(), |ip| format!("ip:{ip}"));
        limiter.ip_limiter.check(&key, config).await
    };

    match result {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());

            Ok(response)
        }
        RateLimitResult::Limited { retry_after, .. } => {
            Metrics::incr(&get_metrics().rate_limited);
            tracing::debug!(retry_after, "Rate limited");
            Err(RateLimitError { retry_after })
        }
    }
}
