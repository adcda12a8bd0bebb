//! API integration tests.
//!
//! Drive the full router (auth middleware, rate limits, handlers) against a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use cyberguard_api::{AppState, RateLimiterState, app};
use cyberguard_common::config::AuthConfig;
use cyberguard_core::{
    AlertService, AuthService, ComplaintService, DashboardService, LogOtpSender,
    NotificationService, OtpService, SuspiciousEntityService, UserService, hashing::hash_secret,
};
use cyberguard_db::{
    entities::{complaint, otp_challenge, user},
    repositories::{
        ComplaintRepository, NotificationRepository, OtpChallengeRepository,
        SuspiciousEntityRepository, UserRepository,
    },
    test_utils::fixtures,
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::Value;
use tower::ServiceExt;

/// Create test app state over the given mock database.
fn create_test_state(db: MockDatabase) -> AppState {
    let db = Arc::new(db.into_connection());

    let user_repo = UserRepository::new(Arc::clone(&db));
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let entity_repo = SuspiciousEntityRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let otp_repo = OtpChallengeRepository::new(Arc::clone(&db));

    let otp_service = OtpService::new(otp_repo, Arc::new(LogOtpSender), &AuthConfig::default());
    let alert_service = AlertService::new(user_repo.clone(), notification_repo.clone());
    let notification_service = NotificationService::new(notification_repo);

    AppState {
        auth_service: AuthService::new(user_repo.clone(), otp_service),
        user_service: UserService::new(user_repo.clone()),
        complaint_service: ComplaintService::new(
            complaint_repo.clone(),
            notification_service.clone(),
        ),
        suspicious_service: SuspiciousEntityService::new(
            entity_repo.clone(),
            notification_service.clone(),
        ),
        notification_service,
        dashboard_service: DashboardService::new(user_repo, complaint_repo, entity_repo),
        alert_service,
        rate_limiter: RateLimiterState::new(),
    }
}

fn create_test_router(db: MockDatabase) -> Router {
    app(create_test_state(db))
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

const CLIENT: &str = "203.0.113.10:40000";

fn post_json(uri: &str, body: &str) -> Request<Body> {
    post_json_from(CLIENT, None, uri, body)
}

/// A JSON POST arriving from `peer`, optionally carrying `X-Forwarded-For`.
fn post_json_from(peer: &str, forwarded: Option<&str>, uri: &str, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(forwarded) = forwarded {
        builder = builder.header("X-Forwarded-For", forwarded);
    }
    let mut req = builder.body(Body::from(body.to_string())).unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
    req
}

fn forgot_from(peer: &str, forwarded: Option<&str>) -> Request<Body> {
    post_json_from(
        peer,
        forwarded,
        "/auth/forgot-password",
        r#"{"userId":"CGNOBODY"}"#,
    )
}

/// A mock database answering `n` user lookups with "no such user".
fn unknown_user_lookups(n: usize) -> MockDatabase {
    (0..n).fold(empty_db(), |db, _| {
        db.append_query_results([Vec::<user::Model>::new()])
    })
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json_with_token(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = create_test_router(empty_db())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint_is_prometheus_text() {
    let response = create_test_router(empty_db())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("# TYPE cyberguard_http_requests_total counter"));
}

#[tokio::test]
async fn test_catalog_endpoint() {
    let response = create_test_router(empty_db())
        .oneshot(Request::builder().uri("/meta/catalog").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["complaintCategories"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["entityTypes"][3]["label"], "UPI ID");
}

#[tokio::test]
async fn test_notifications_require_auth() {
    let response = create_test_router(empty_db())
        .oneshot(Request::builder().uri("/notifications").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_register_rejects_short_aadhaar() {
    let response = create_test_router(empty_db())
        .oneshot(post_json(
            "/auth/register",
            r#"{"name":"Asha","aadhaarNumber":"12345","phoneNumber":"9876543210","address":"Pune"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let db = empty_db().append_query_results([Vec::<user::Model>::new()]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/auth/login",
            r#"{"userId":"CGNOBODY","password":"secret1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_without_password_carries_user_id() {
    let db = empty_db().append_query_results([[fixtures::citizen("CGTEST01")]]);

    let response = create_test_router(db)
        .oneshot(post_json(
            "/auth/login",
            r#"{"userId":"CGTEST01","password":"secret1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "PASSWORD_NOT_SET");
    assert_eq!(body["error"]["userId"], "CGTEST01");
}

#[tokio::test]
async fn test_forgot_password_unknown_user() {
    let db = empty_db().append_query_results([Vec::<user::Model>::new()]);

    let response = create_test_router(db)
        .oneshot(post_json("/auth/forgot-password", r#"{"userId":"CGNOBODY"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "User ID not found");
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited_per_ip() {
    let app = create_test_router(unknown_user_lookups(10));

    for _ in 0..10 {
        let response = app
            .clone()
            .oneshot(post_json("/auth/forgot-password", r#"{"userId":"CGNOBODY"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app
        .oneshot(post_json("/auth/forgot-password", r#"{"userId":"CGNOBODY"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_auth_rate_limit_buckets_are_per_peer() {
    let app = create_test_router(unknown_user_lookups(11));

    for _ in 0..10 {
        let response = app
            .clone()
            .oneshot(forgot_from("192.0.2.1:50000", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let limited = app
        .clone()
        .oneshot(forgot_from("192.0.2.1:50001", None))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = app
        .oneshot(forgot_from("192.0.2.2:50000", None))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forwarded_header_ignored_without_trusted_proxy() {
    let app = create_test_router(unknown_user_lookups(10));

    for _ in 0..10 {
        app.clone()
            .oneshot(forgot_from("192.0.2.1:50000", None))
            .await
            .unwrap();
    }

    for spoofed in ["198.51.100.1", "198.51.100.2", "198.51.100.3"] {
        let response = app
            .clone()
            .oneshot(forgot_from("192.0.2.1:50000", Some(spoofed)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

#[tokio::test]
async fn test_forwarded_header_keys_limit_behind_trusted_proxy() {
    let mut state = create_test_state(unknown_user_lookups(11));
    state.rate_limiter = RateLimiterState::new().with_trusted_proxy(true);
    let router = app(state);

    for _ in 0..10 {
        let response = router
            .clone()
            .oneshot(forgot_from("10.0.0.2:443", Some("203.0.113.20")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let limited = router
        .clone()
        .oneshot(forgot_from("10.0.0.2:443", Some("203.0.113.20")))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = router
        .oneshot(forgot_from("10.0.0.2:443", Some("203.0.113.21")))
        .await
        .unwrap();
    assert_eq!(other_client.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_password_ends_existing_session() {
    let mut account = fixtures::citizen("CGTEST01");
    account.password_hash = Some(hash_secret("old-secret").unwrap());
    let challenge = fixtures::otp_challenge(
        "otp1",
        "CGTEST01",
        otp_challenge::OtpPurpose::PasswordReset,
        &hash_secret("482913").unwrap(),
    );
    let mut reset = account.clone();
    reset.token = None;

    let db = empty_db()
        .append_query_results([[account]])
        .append_query_results([[challenge]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([[reset]])
        // The old bearer token no longer matches any account.
        .append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/reset-password",
            r#"{"userId":"CGTEST01","otp":"482913","newPassword":"new-secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);

    let response = app
        .oneshot(get_with_token("/notifications", "token-CGTEST01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_password_rejects_malformed_otp() {
    let response = create_test_router(empty_db())
        .oneshot(post_json(
            "/auth/reset-password",
            r#"{"userId":"CGTEST01","otp":"12ab","newPassword":"new-secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_stats_forbidden_for_citizen() {
    let db = empty_db().append_query_results([[fixtures::citizen("CGTEST01")]]);

    let response = create_test_router(db)
        .oneshot(get_with_token("/admin/stats", "token-CGTEST01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

const ALERT: &str =
    r#"{"title":"Fake KYC calls","message":"Never share an OTP.","severity":"high"}"#;

#[tokio::test]
async fn test_citizen_cannot_broadcast_alert() {
    let db = empty_db().append_query_results([[fixtures::citizen("CGTEST01")]]);

    let response = create_test_router(db)
        .oneshot(post_json_with_token("/admin/alerts", "token-CGTEST01", ALERT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_official_broadcasts_alert_to_citizens() {
    let citizens = ["CGTEST01", "CGTEST02", "CGTEST03"]
        .map(|id| BTreeMap::from([("id", sea_orm::Value::from(id))]));
    let db = empty_db()
        .append_query_results([[fixtures::official("CGOFFCR1")]])
        .append_query_results([citizens])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 3,
        }]);

    let response = create_test_router(db)
        .oneshot(post_json_with_token("/admin/alerts", "token-CGOFFCR1", ALERT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["recipients"], 3);
}

#[tokio::test]
async fn test_citizen_cannot_list_other_users_complaints() {
    let db = empty_db().append_query_results([[fixtures::citizen("CGTEST01")]]);

    let response = create_test_router(db)
        .oneshot(get_with_token("/grievance/user/CGOTHER1", "token-CGTEST01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_own_complaints() {
    let db = empty_db()
        .append_query_results([[fixtures::citizen("CGTEST01")]])
        .append_query_results([vec![
            fixtures::complaint("CR2", "CGTEST01"),
            fixtures::complaint("CR1", "CGTEST01"),
        ]]);

    let response = create_test_router(db)
        .oneshot(get_with_token("/grievance/user/CGTEST01", "token-CGTEST01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], "CR2");
    assert_eq!(list[0]["statusLabel"], "Submitted");
}

#[tokio::test]
async fn test_complaint_detail_includes_timeline() {
    let db = empty_db()
        .append_query_results([[fixtures::citizen("CGTEST01")]])
        .append_query_results([[fixtures::complaint("CRTEST", "CGTEST01")]])
        .append_query_results([[fixtures::complaint_event(
            "e1",
            "CRTEST",
            complaint::ComplaintStatus::Submitted,
        )]]);

    let response = create_test_router(db)
        .oneshot(get_with_token("/grievance/CRTEST", "token-CGTEST01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], "CRTEST");
    assert_eq!(body["data"]["timeline"][0]["label"], "Submitted");
}

#[tokio::test]
async fn test_profile_masks_aadhaar() {
    let db = empty_db().append_query_results([[fixtures::citizen("CGTEST01")]]);

    let response = create_test_router(db)
        .oneshot(get_with_token("/user/profile/CGTEST01", "token-CGTEST01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["aadhaarNumber"], "XXXXXXXX1234");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let response = create_test_router(empty_db())
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
