//! Notification service.

use chrono::Utc;
use cyberguard_common::{AppError, AppResult, IdGenerator};
use cyberguard_db::{
    entities::notification::{self, NotificationPriority, NotificationType},
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Default page size for notification lists.
const DEFAULT_LIMIT: u64 = 50;
/// Largest page a caller may ask for.
const MAX_LIMIT: u64 = 100;

/// A notification about to be created.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub complaint_id: Option<String>,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store a notification for a user.
    pub async fn notify(&self, new: NewNotification) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(new.user_id),
            notification_type: Set(new.notification_type),
            title: Set(new.title),
            message: Set(new.message),
            priority: Set(new.priority),
            complaint_id: Set(new.complaint_id),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let created = self.notification_repo.create(model).await?;
        tracing::debug!(
            user_id = %created.user_id,
            kind = ?created.notification_type,
            "Notification created"
        );
        Ok(created)
    }

    /// Notifications for a user, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: Option<u64>,
    ) -> AppResult<Vec<notification::Model>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.notification_repo
            .find_by_user(user_id, limit, unread_only)
            .await
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark one notification as read. Other users' notifications look missing.
    pub async fn mark_read(&self, id: &str, user_id: &str) -> AppResult<notification::Model> {
        let notification = self
            .notification_repo
            .find_by_id(id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {id}")))?;

        if notification.is_read {
            return Ok(notification);
        }
        self.notification_repo.mark_as_read(notification).await
    }

    /// Mark every notification of a user as read.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use cyberguard_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: MockDatabase) -> NotificationService {
        NotificationService::new(NotificationRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_notify() {
        let stored = fixtures::notification("n1", "CGTEST01");
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored]]);

        let created = service(db)
            .notify(NewNotification {
                user_id: "CGTEST01".to_string(),
                notification_type: NotificationType::ComplaintUpdate,
                title: "Complaint updated".to_string(),
                message: "Your complaint is now Acknowledged".to_string(),
                priority: NotificationPriority::Medium,
                complaint_id: None,
            })
            .await
            .unwrap();

        assert_eq!(created.user_id, "CGTEST01");
        assert!(!created.is_read);
    }

    #[tokio::test]
    async fn test_mark_read_other_user_is_not_found() {
        let stored = fixtures::notification("n1", "CGOTHER1");
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored]]);

        let result = service(db).mark_read("n1", "CGTEST01").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_read() {
        let stored = fixtures::notification("n1", "CGTEST01");
        let mut read = stored.clone();
        read.is_read = true;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored]])
            .append_query_results([[read]]);

        let updated = service(db).mark_read("n1", "CGTEST01").await.unwrap();

        assert!(updated.is_read);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            },
        ]);

        assert_eq!(service(db).mark_all_read("CGTEST01").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::notification("n1", "CGTEST01")]]);

        let list = service(db)
            .list("CGTEST01", false, Some(10_000))
            .await
            .unwrap();

        assert_eq!(list.len(), 1);
    }
}
