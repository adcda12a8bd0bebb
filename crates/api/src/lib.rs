//! HTTP API layer for the CyberGuard portal.
//!
//! - **Endpoints**: auth, profiles, complaints, suspicious entity reports,
//!   notifications, admin and reference data
//! - **Extractors**: `AuthUser`, `OfficialUser`, `BearerToken`
//! - **Middleware**: bearer auth, request metrics, rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

use axum::{Router, middleware::{from_fn, from_fn_with_state}};

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};

/// The full application: routes, bearer auth and request metrics.
///
/// Transport concerns (tracing, CORS, timeouts, body limits) are layered on
/// by the server binary.
pub fn app(state: AppState) -> Router {
    router(&state)
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(from_fn(middleware::metrics_middleware))
        .with_state(state)
}
