//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `cyberguard_test`)
//!   `TEST_DB_PASSWORD` (default: `cyberguard_test`)
//!   `TEST_DB_NAME` (default: `cyberguard_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use cyberguard_common::AppError;
use cyberguard_db::entities::{complaint, complaint_event, user};
use cyberguard_db::repositories::{ComplaintRepository, UserRepository};
use cyberguard_db::test_utils::{TestDatabase, TestDbConfig, fixtures};
use sea_orm::{ActiveModelTrait, IntoActiveModel};

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_and_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_aadhaar_is_unique() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);
    let users = UserRepository::new(Arc::clone(&conn));

    users
        .create(fixtures::citizen("CGDUPE01").into_active_model().reset_all())
        .await
        .unwrap();
    let duplicate = users
        .create(fixtures::citizen("CGDUPE02").into_active_model().reset_all())
        .await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_complaint_with_timeline_round_trip() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);

    fixtures::citizen("CGTIME01")
        .into_active_model()
        .reset_all()
        .insert(conn.as_ref())
        .await
        .unwrap();

    let complaints = ComplaintRepository::new(Arc::clone(&conn));
    let complaint: complaint::ActiveModel = fixtures::complaint("CRTIME01", "CGTIME01")
        .into_active_model()
        .reset_all();
    let event: complaint_event::ActiveModel =
        fixtures::complaint_event("evtime01", "CRTIME01", complaint::ComplaintStatus::Submitted)
            .into_active_model()
            .reset_all();

    complaints.create_with_event(complaint, event).await.unwrap();

    let timeline = complaints.find_events("CRTIME01").await.unwrap();
    assert_eq!(timeline.len(), 1);

    let listed = complaints.find_by_user("CGTIME01").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, complaint::ComplaintStatus::Submitted);

    let count = users_with_role(&conn).await;
    assert_eq!(count, 1);
}

async fn users_with_role(conn: &Arc<sea_orm::DatabaseConnection>) -> u64 {
    UserRepository::new(Arc::clone(conn))
        .count_by_role(user::UserRole::Citizen)
        .await
        .unwrap()
}
