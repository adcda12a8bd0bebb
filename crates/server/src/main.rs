//! CyberGuard portal server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use cyberguard_api::{AppState, RateLimiterState, app};
use cyberguard_common::{Config, config::LogFormat};
use cyberguard_core::{
    AlertService, AuthService, ComplaintService, DashboardService, LogOtpSender,
    NotificationService,
    OtpService, SuspiciousEntityService, UserService,
};
use cyberguard_db::repositories::{
    ComplaintRepository, NotificationRepository, OtpChallengeRepository,
    SuspiciousEntityRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_LIMIT: usize = 64 * 1024;
const RATE_LIMIT_SWEEP: Duration = Duration::from_secs(300);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cyberguard=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration comes first so the log format can follow it.
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(config.log.format);

    info!("Starting CyberGuard portal server...");

    let db = cyberguard_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    cyberguard_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let entity_repo = SuspiciousEntityRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let otp_repo = OtpChallengeRepository::new(Arc::clone(&db));

    // Initialize services
    if config.auth.otp_fixed_code.is_some() {
        warn!("Fixed OTP code is enabled; do not use this setting in production");
    }
    let otp_service = OtpService::new(otp_repo, Arc::new(LogOtpSender), &config.auth);
    let alert_service = AlertService::new(user_repo.clone(), notification_repo.clone());
    let notification_service = NotificationService::new(notification_repo);
    let auth_service = AuthService::new(user_repo.clone(), otp_service);
    let user_service = UserService::new(user_repo.clone());
    let complaint_service =
        ComplaintService::new(complaint_repo.clone(), notification_service.clone());
    let suspicious_service =
        SuspiciousEntityService::new(entity_repo.clone(), notification_service.clone());
    let dashboard_service = DashboardService::new(user_repo, complaint_repo, entity_repo);

    if config.server.trust_proxy {
        info!("Rate limits key on forwarded client addresses");
    }
    let rate_limiter = RateLimiterState::new().with_trusted_proxy(config.server.trust_proxy);

    // Periodically drop expired rate limit windows
    let sweeper = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP);
        loop {
            interval.tick().await;
            sweeper.cleanup().await;
        }
    });

    let state = AppState {
        auth_service,
        user_service,
        complaint_service,
        suspicious_service,
        notification_service,
        dashboard_service,
        alert_service,
        rate_limiter,
    };

    let router = app(state)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.cors_origins));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.host))?;
    info!(%addr, url = %config.server.url, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
