//! API middleware.

#![allow(missing_docs)]

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use cyberguard_common::get_metrics;
use cyberguard_core::{
    AlertService, AuthService, ComplaintService, DashboardService, NotificationService,
    SuspiciousEntityService, UserService,
};

use crate::rate_limit::RateLimiterState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub complaint_service: ComplaintService,
    pub suspicious_service: SuspiciousEntityService,
    pub notification_service: NotificationService,
    pub dashboard_service: DashboardService,
    pub alert_service: AlertService,
    pub rate_limiter: RateLimiterState,
}

/// Authentication middleware.
///
/// A valid bearer token puts the account into the request extensions.
/// Requests without one pass through; extractors decide whether that is fine.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}

/// Request counters for `/metrics`.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let metrics = get_metrics();
    let started = Instant::now();
    metrics.start_request();

    let response = next.run(req).await;

    metrics.end_request();
    metrics.record_http_request(response.status().as_u16(), started.elapsed());
    response
}
