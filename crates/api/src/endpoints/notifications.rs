//! Notification endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use cyberguard_common::AppResult;
use cyberguard_db::entities::notification::{self, NotificationPriority, NotificationType};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    /// Maximum results (default: 50, max: 100)
    pub limit: Option<u64>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Notification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complaint_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            priority: n.priority,
            complaint_id: n.complaint_id,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Notifications plus the unread badge count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// Count of notifications marked read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// Get notifications for the authenticated user.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    let notifications = state
        .notification_service
        .list(&user.id, query.unread_only, query.limit)
        .await?;
    let unread_count = state.notification_service.unread_count(&user.id).await?;

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

/// Mark one notification as read.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = state.notification_service.mark_read(&id, &user.id).await?;
    Ok(ApiResponse::ok(notification.into()))
}

/// Mark all notifications as read.
async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllReadResponse>> {
    let updated = state.notification_service.mark_all_read(&user.id).await?;
    Ok(ApiResponse::ok(MarkAllReadResponse { updated }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
}
