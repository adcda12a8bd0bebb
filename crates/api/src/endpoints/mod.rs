//! API endpoints.

mod admin;
mod auth;
mod grievance;
mod meta;
mod metrics;
mod notifications;
mod suspicious;
mod users;

use axum::{Router, middleware::from_fn_with_state};

use crate::{middleware::AppState, rate_limit::rate_limit_auth_middleware};

pub use auth::SessionResponse;
pub use grievance::{ComplaintDetailResponse, ComplaintResponse, TimelineEntryResponse};
pub use notifications::NotificationResponse;
pub use suspicious::SuspiciousReportResponse;
pub use users::UserResponse;

/// Create the API router.
pub fn router(state: &AppState) -> Router<AppState> {
    let auth = auth::router().route_layer(from_fn_with_state(
        state.rate_limiter.clone(),
        rate_limit_auth_middleware,
    ));

    Router::new()
        .merge(metrics::router())
        .nest("/auth", auth)
        .nest("/user", users::router())
        .nest("/grievance", grievance::router(state))
        .nest("/suspicious", suspicious::router(state))
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
        .nest("/meta", meta::router())
}
