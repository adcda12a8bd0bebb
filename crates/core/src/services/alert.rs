//! Security alerts broadcast by officials.

use chrono::Utc;
use cyberguard_common::{AppResult, IdGenerator};
use cyberguard_db::{
    entities::{
        notification::{self, NotificationPriority, NotificationType},
        user,
    },
    repositories::{NotificationRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::user::require_official;

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl From<AlertSeverity> for NotificationPriority {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Low => Self::Low,
            AlertSeverity::Medium => Self::Medium,
            AlertSeverity::High => Self::High,
        }
    }
}

/// An alert to send to every citizen.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastAlertInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 2000))]
    pub message: String,

    pub severity: AlertSeverity,
}

/// Service for broadcasting security alerts.
#[derive(Clone)]
pub struct AlertService {
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl AlertService {
    /// Create a new alert service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, notification_repo: NotificationRepository) -> Self {
        Self {
            user_repo,
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Put a `new_alert` notification in every citizen's inbox.
    ///
    /// Returns the number of notifications written.
    pub async fn broadcast(
        &self,
        input: BroadcastAlertInput,
        official: &user::Model,
    ) -> AppResult<u64> {
        input.validate()?;
        require_official(official)?;

        let recipients = self
            .user_repo
            .find_ids_by_role(user::UserRole::Citizen)
            .await?;
        let priority = NotificationPriority::from(input.severity);
        let now = Utc::now();

        let models = recipients
            .into_iter()
            .map(|user_id| notification::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id),
                notification_type: Set(NotificationType::NewAlert),
                title: Set(input.title.clone()),
                message: Set(input.message.clone()),
                priority: Set(priority),
                complaint_id: Set(None),
                is_read: Set(false),
                created_at: Set(now.into()),
            })
            .collect();

        let sent = self.notification_repo.create_many(models).await?;
        tracing::info!(
            official = %official.id,
            severity = ?input.severity,
            recipients = sent,
            "Alert broadcast"
        );
        Ok(sent)
    }
}
