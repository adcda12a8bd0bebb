//! Suspicious entity report endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use cyberguard_common::AppResult;
use cyberguard_core::{ReportSuspiciousInput, require_self_or_official};
use cyberguard_db::entities::suspicious_entity::{
    self, EntityReportStatus, EntityType, RiskLevel,
};
use serde::Serialize;

use crate::{
    extractors::AuthUser, middleware::AppState, rate_limit::rate_limit_report_middleware,
    response::ApiResponse,
};

/// Suspicious entity report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousReportResponse {
    pub id: String,
    pub user_id: String,
    pub entity_type: EntityType,
    pub entity_type_label: &'static str,
    pub entity_value: String,
    pub suspicion_reasons: serde_json::Value,
    pub description: String,
    pub risk_level: RiskLevel,
    pub encountered_where: Option<String>,
    pub additional_info: Option<String>,
    pub status: EntityReportStatus,
    pub evidence: serde_json::Value,
    pub reviewed_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<suspicious_entity::Model> for SuspiciousReportResponse {
    fn from(r: suspicious_entity::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            entity_type: r.entity_type,
            entity_type_label: r.entity_type.label(),
            entity_value: r.entity_value,
            suspicion_reasons: r.suspicion_reasons,
            description: r.description,
            risk_level: r.risk_level,
            encountered_where: r.encountered_where,
            additional_info: r.additional_info,
            status: r.status,
            evidence: r.evidence,
            reviewed_by: r.reviewed_by,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report_id: String,
    /// Earlier reports of the same value.
    pub previous_reports: u64,
    pub report: SuspiciousReportResponse,
}

/// Report a suspicious entity.
async fn report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ReportSuspiciousInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let outcome = state.suspicious_service.report(&user, input).await?;

    Ok(ApiResponse::created(ReportResponse {
        report_id: outcome.report.id.clone(),
        previous_reports: outcome.previous_reports,
        report: outcome.report.into(),
    }))
}

/// Reports filed by a user.
async fn list_for_user(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<SuspiciousReportResponse>>> {
    require_self_or_official(&viewer, &user_id)?;

    let reports = state.suspicious_service.list_for_user(&user_id).await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/report",
            post(report).route_layer(from_fn_with_state(
                state.rate_limiter.clone(),
                rate_limit_report_middleware,
            )),
        )
        .route("/user/{id}", get(list_for_user))
}
