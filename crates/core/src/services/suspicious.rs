//! Suspicious entity reports: websites, numbers, UPI handles and the like.

use std::sync::LazyLock;

use chrono::Utc;
use cyberguard_common::{
    AppError, AppResult, IdGenerator, Metrics, get_metrics,
    validation::{is_valid_phone, normalize_phone},
};
use cyberguard_db::{
    entities::{
        notification::{NotificationPriority, NotificationType},
        suspicious_entity::{self, EntityReportStatus, EntityType, RiskLevel},
        user,
    },
    repositories::{SuspiciousEntityFilter, SuspiciousEntityRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use url::Url;
use validator::{Validate, ValidateEmail};

use super::{
    catalog::is_valid_reason,
    complaint::validate_evidence,
    notification::{NewNotification, NotificationService},
};

const MAX_PAGE: u64 = 100;

static UPI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._-]{2,256}@[a-z][a-z0-9]{1,63}$").expect("valid UPI regex")
});

/// Input for reporting a suspicious entity.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportSuspiciousInput {
    pub entity_type: EntityType,

    #[validate(length(min = 1, max = 2048))]
    pub entity_value: String,

    #[validate(length(min = 1, max = 11))]
    pub suspicion_reasons: Vec<String>,

    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    #[serde(default)]
    pub risk_level: RiskLevel,

    #[validate(length(max = 256))]
    pub encountered_where: Option<String>,

    #[validate(length(max = 5000))]
    pub additional_info: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_evidence"))]
    pub evidence: Vec<String>,
}

/// Input for an official's verdict on a report.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntityInput {
    pub status: EntityReportStatus,

    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// A stored report plus how often the same value was reported before it.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report: suspicious_entity::Model,
    pub previous_reports: u64,
}

/// Check `value` against the rules for `entity_type` and return its stored form.
pub fn normalize_entity_value(entity_type: EntityType, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!(
            "{} cannot be empty",
            entity_type.label()
        )));
    }

    match entity_type {
        EntityType::Website => {
            // "host:port" parses as a URL with scheme "host", so only an
            // explicit "://" counts as a scheme.
            let parsed = if value.contains("://") {
                Url::parse(value)
            } else {
                Url::parse(&format!("https://{value}"))
            }
            .map_err(|_| AppError::Validation(format!("Invalid URL: {value}")))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(AppError::Validation(format!(
                    "URL must be an http or https address: {value}"
                )));
            }
            Ok(parsed.to_string())
        }
        EntityType::PhoneNumber => {
            let phone = normalize_phone(value);
            if is_valid_phone(&phone) {
                Ok(phone)
            } else {
                Err(AppError::Validation(
                    "Phone number must be exactly 10 digits".to_string(),
                ))
            }
        }
        EntityType::UpiId => {
            let upi = value.to_lowercase();
            if UPI_RE.is_match(&upi) {
                Ok(upi)
            } else {
                Err(AppError::Validation(format!(
                    "UPI ID must look like name@bank: {value}"
                )))
            }
        }
        EntityType::Email => {
            let email = value.to_lowercase();
            if email.validate_email() {
                Ok(email)
            } else {
                Err(AppError::Validation(format!("Invalid email address: {value}")))
            }
        }
        EntityType::MobileApp | EntityType::SocialMedia => Ok(value.to_string()),
    }
}

/// Suspicious entity service.
#[derive(Clone)]
pub struct SuspiciousEntityService {
    entity_repo: SuspiciousEntityRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl SuspiciousEntityService {
    /// Create a new suspicious entity service.
    #[must_use]
    pub const fn new(
        entity_repo: SuspiciousEntityRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            entity_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report. It waits in `under_analysis` until an official reviews it.
    pub async fn report(
        &self,
        user: &user::Model,
        input: ReportSuspiciousInput,
    ) -> AppResult<ReportOutcome> {
        input.validate()?;

        let entity_value = normalize_entity_value(input.entity_type, &input.entity_value)?;
        if let Some(reason) = input.suspicion_reasons.iter().find(|r| !is_valid_reason(r)) {
            return Err(AppError::Validation(format!(
                "Unknown suspicion reason: {reason}"
            )));
        }

        let previous_reports = self
            .entity_repo
            .count_reports_for_value(input.entity_type, &entity_value)
            .await?;

        let model = suspicious_entity::ActiveModel {
            id: Set(self.id_gen.generate_suspicious_report_id()),
            user_id: Set(user.id.clone()),
            entity_type: Set(input.entity_type),
            entity_value: Set(entity_value),
            suspicion_reasons: Set(serde_json::json!(input.suspicion_reasons)),
            description: Set(input.description),
            risk_level: Set(input.risk_level),
            encountered_where: Set(input.encountered_where),
            additional_info: Set(input.additional_info),
            status: Set(EntityReportStatus::UnderAnalysis),
            evidence: Set(serde_json::json!(input.evidence)),
            reviewed_by: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let report = self.entity_repo.create(model).await?;

        Metrics::incr(&get_metrics().suspicious_reports_filed);
        tracing::info!(
            report_id = %report.id,
            entity_type = ?report.entity_type,
            previous_reports,
            "Suspicious entity reported"
        );

        Ok(ReportOutcome {
            report,
            previous_reports,
        })
    }

    /// Reports filed by a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<suspicious_entity::Model>> {
        self.entity_repo.find_by_user(user_id).await
    }

    /// Every report, newest first.
    pub async fn list_all(
        &self,
        status: Option<EntityReportStatus>,
        entity_type: Option<EntityType>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<suspicious_entity::Model>> {
        let filter = SuspiciousEntityFilter {
            status,
            entity_type,
            limit: limit.unwrap_or(MAX_PAGE).clamp(1, MAX_PAGE),
            offset: offset.unwrap_or(0),
        };
        self.entity_repo.find_all(&filter).await
    }

    /// Record an official's verdict and tell the reporter.
    pub async fn review(
        &self,
        id: &str,
        input: ReviewEntityInput,
        official: &user::Model,
    ) -> AppResult<suspicious_entity::Model> {
        input.validate()?;
        if !official.is_official() {
            return Err(AppError::Forbidden(
                "Only officials can review reports".to_string(),
            ));
        }
        if input.status == EntityReportStatus::UnderAnalysis {
            return Err(AppError::BadRequest(
                "A review must conclude the analysis".to_string(),
            ));
        }

        let report = self
            .entity_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id}")))?;
        if report.status != EntityReportStatus::UnderAnalysis {
            return Err(AppError::BadRequest(
                "Report has already been reviewed".to_string(),
            ));
        }

        let changes = suspicious_entity::ActiveModel {
            status: Set(input.status),
            reviewed_by: Set(Some(official.id.clone())),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        let updated = self
            .entity_repo
            .update_from_status(id, report.status, changes)
            .await?;

        tracing::info!(
            report_id = %updated.id,
            status = ?updated.status,
            official = %official.id,
            "Suspicious entity reviewed"
        );

        let verdict = match updated.status {
            EntityReportStatus::VerifiedThreat => "confirmed as a threat",
            EntityReportStatus::FalsePositive => "found to be safe",
            EntityReportStatus::Blocked => "blocked",
            EntityReportStatus::UnderAnalysis => "under analysis",
        };
        let mut message = format!(
            "The {} you reported ({}) was {verdict}.",
            updated.entity_type.label(),
            updated.entity_value
        );
        if let Some(note) = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            message.push(' ');
            message.push_str(note);
        }

        self.notification_service
            .notify(NewNotification {
                user_id: updated.user_id.clone(),
                notification_type: NotificationType::EntityReviewed,
                title: "Report reviewed".to_string(),
                message,
                priority: NotificationPriority::Low,
                complaint_id: None,
            })
            .await?;

        Ok(updated)
    }
}
