//! Complaint intake and case handling.

use chrono::{NaiveDate, Utc};
use cyberguard_common::{AppError, AppResult, IdGenerator, Metrics, get_metrics};
use cyberguard_db::{
    entities::{
        complaint::{self, ComplaintStatus, UrgencyLevel},
        complaint_event,
        notification::{NotificationPriority, NotificationType},
        user,
    },
    repositories::{ComplaintFilter, ComplaintRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::{
    catalog::{find_category, is_valid_subcategory},
    notification::{NewNotification, NotificationService},
};

/// Most evidence references a complaint may carry.
const MAX_EVIDENCE_ITEMS: usize = 20;
const MAX_PAGE: u64 = 100;

/// Input for filing a complaint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitComplaintInput {
    #[validate(length(min = 1, max = 64))]
    pub category: String,

    #[validate(length(min = 1, max = 128))]
    pub subcategory: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    pub incident_date: Option<NaiveDate>,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(max = 512))]
    pub suspicious_entity: Option<String>,

    #[validate(range(min = 0.0))]
    pub financial_loss: Option<f64>,

    #[serde(default)]
    pub urgency_level: UrgencyLevel,

    #[serde(default)]
    pub is_anonymous: bool,

    /// References to evidence held elsewhere (file names, links).
    #[serde(default)]
    #[validate(custom(function = "validate_evidence"))]
    pub evidence: Vec<String>,
}

pub(crate) fn validate_evidence(evidence: &[String]) -> Result<(), ValidationError> {
    if evidence.len() > MAX_EVIDENCE_ITEMS {
        return Err(ValidationError::new("evidence_count"));
    }
    if evidence
        .iter()
        .any(|item| item.trim().is_empty() || item.len() > 512)
    {
        return Err(ValidationError::new("evidence_item"));
    }
    Ok(())
}

/// Input for moving a complaint along its lifecycle.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintStatusInput {
    pub status: ComplaintStatus,

    /// Shown on the timeline and in the notification.
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// A complaint with its timeline, oldest entry first.
#[derive(Debug, Clone)]
pub struct ComplaintDetail {
    pub complaint: complaint::Model,
    pub timeline: Vec<complaint_event::Model>,
}

/// A complaint as listed for officials.
#[derive(Debug, Clone)]
pub struct ComplaintWithOwner {
    pub complaint: complaint::Model,
    /// `None` when the complaint was filed anonymously.
    pub owner_name: Option<String>,
}

/// Check that a complaint may move from `from` to `to`.
pub fn check_transition(from: ComplaintStatus, to: ComplaintStatus) -> AppResult<()> {
    if from.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "Complaint is already {} and cannot change",
            from.label()
        )));
    }
    if to == from {
        return Err(AppError::BadRequest(format!(
            "Complaint is already {}",
            from.label()
        )));
    }
    if to == ComplaintStatus::Submitted {
        return Err(AppError::BadRequest(
            "Complaint cannot return to Submitted".to_string(),
        ));
    }
    Ok(())
}

/// Complaint service for business logic.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            complaint_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a complaint. It starts as submitted with one timeline entry.
    pub async fn submit(
        &self,
        user: &user::Model,
        input: SubmitComplaintInput,
    ) -> AppResult<complaint::Model> {
        input.validate()?;

        let category = find_category(&input.category).ok_or_else(|| {
            AppError::Validation(format!("Unknown complaint category: {}", input.category))
        })?;
        if !is_valid_subcategory(category.name, &input.subcategory) {
            return Err(AppError::Validation(format!(
                "Unknown subcategory for {}: {}",
                category.name, input.subcategory
            )));
        }
        if input.financial_loss.is_some() && !category.tracks_financial_loss {
            return Err(AppError::Validation(format!(
                "Financial loss cannot be reported for {}",
                category.name
            )));
        }
        if input.incident_date.is_some_and(|d| d > Utc::now().date_naive()) {
            return Err(AppError::Validation(
                "Incident date cannot be in the future".to_string(),
            ));
        }

        let id = self.id_gen.generate_complaint_id();
        let now = Utc::now();

        let model = complaint::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(user.id.clone()),
            category: Set(input.category),
            subcategory: Set(input.subcategory),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            incident_date: Set(input.incident_date),
            location: Set(non_blank(input.location)),
            suspicious_entity: Set(non_blank(input.suspicious_entity)),
            financial_loss: Set(input.financial_loss),
            urgency_level: Set(input.urgency_level),
            is_anonymous: Set(input.is_anonymous),
            status: Set(ComplaintStatus::Submitted),
            evidence: Set(serde_json::json!(input.evidence)),
            handled_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let event = complaint_event::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(id),
            status: Set(ComplaintStatus::Submitted),
            description: Set("Complaint received".to_string()),
            officer: Set(None),
            created_at: Set(now.into()),
        };

        let created = self.complaint_repo.create_with_event(model, event).await?;

        Metrics::incr(&get_metrics().complaints_filed);
        tracing::info!(
            complaint_id = %created.id,
            user_id = %user.id,
            category = %created.category,
            "Complaint filed"
        );
        Ok(created)
    }

    /// Complaints filed by a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo.find_by_user(user_id).await
    }

    /// A complaint and its timeline, visible to its owner and to officials.
    pub async fn get_with_timeline(
        &self,
        id: &str,
        viewer: &user::Model,
    ) -> AppResult<ComplaintDetail> {
        let complaint = self.complaint_repo.get_by_id(id).await?;
        if complaint.user_id != viewer.id && !viewer.is_official() {
            // Someone else's complaint is indistinguishable from a missing one.
            return Err(AppError::ComplaintNotFound(id.to_string()));
        }

        let timeline = self.complaint_repo.find_events(&complaint.id).await?;
        Ok(ComplaintDetail {
            complaint,
            timeline,
        })
    }

    /// Every complaint, newest first, with the complainant's name.
    pub async fn list_all(
        &self,
        status: Option<ComplaintStatus>,
        category: Option<String>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<ComplaintWithOwner>> {
        let filter = ComplaintFilter {
            status,
            category,
            limit: limit.unwrap_or(MAX_PAGE).clamp(1, MAX_PAGE),
            offset: offset.unwrap_or(0),
        };

        let rows = self.complaint_repo.find_all_with_user(&filter).await?;
        Ok(rows
            .into_iter()
            .map(|(complaint, owner)| {
                let owner_name = if complaint.is_anonymous {
                    None
                } else {
                    owner.map(|u| u.name)
                };
                ComplaintWithOwner {
                    complaint,
                    owner_name,
                }
            })
            .collect())
    }

    /// Move a complaint to a new status and tell its owner.
    pub async fn update_status(
        &self,
        id: &str,
        input: UpdateComplaintStatusInput,
        official: &user::Model,
    ) -> AppResult<complaint::Model> {
        input.validate()?;
        if !official.is_official() {
            return Err(AppError::Forbidden(
                "Only officials can update complaints".to_string(),
            ));
        }

        let complaint = self.complaint_repo.get_by_id(id).await?;
        check_transition(complaint.status, input.status)?;

        let now = Utc::now();
        let note = non_blank(input.note);
        let description = note
            .clone()
            .unwrap_or_else(|| format!("Status changed to {}", input.status.label()));

        let changes = complaint::ActiveModel {
            status: Set(input.status),
            handled_by: Set(Some(official.id.clone())),
            updated_at: Set(Some(now.into())),
            ..Default::default()
        };

        let event = complaint_event::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(id.to_string()),
            status: Set(input.status),
            description: Set(description),
            officer: Set(Some(official.name.clone())),
            created_at: Set(now.into()),
        };

        let updated = self
            .complaint_repo
            .update_status_with_event(id, complaint.status, changes, event)
            .await?;
        Metrics::incr(&get_metrics().complaint_status_changes);
        tracing::info!(
            complaint_id = %updated.id,
            status = ?updated.status,
            official = %official.id,
            "Complaint status changed"
        );

        let resolved = updated.status == ComplaintStatus::Resolved;
        let mut message = format!(
            "Your complaint {} is now {}.",
            updated.id,
            updated.status.label()
        );
        if let Some(note) = &note {
            message.push(' ');
            message.push_str(note);
        }
        self.notification_service
            .notify(NewNotification {
                user_id: updated.user_id.clone(),
                notification_type: if resolved {
                    NotificationType::ComplaintResolved
                } else {
                    NotificationType::ComplaintUpdate
                },
                title: if resolved {
                    "Complaint resolved".to_string()
                } else {
                    "Complaint updated".to_string()
                },
                message,
                priority: if updated.status.is_terminal() {
                    NotificationPriority::High
                } else {
                    NotificationPriority::Medium
                },
                complaint_id: Some(updated.id.clone()),
            })
            .await?;

        Ok(updated)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
