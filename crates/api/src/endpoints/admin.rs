//! Admin endpoints for officials.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use cyberguard_common::AppResult;
use cyberguard_core::{
    BroadcastAlertInput, ComplaintWithOwner, DashboardStats, ReviewEntityInput,
    UpdateComplaintStatusInput,
};
use cyberguard_db::entities::{
    complaint::ComplaintStatus,
    suspicious_entity::{EntityReportStatus, EntityType},
};
use serde::{Deserialize, Serialize};

use super::{grievance::ComplaintResponse, suspicious::SuspiciousReportResponse};
use crate::{extractors::OfficialUser, middleware::AppState, response::ApiResponse};

/// Complaint list filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintListQuery {
    pub status: Option<ComplaintStatus>,
    pub category: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Report list filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListQuery {
    pub status: Option<EntityReportStatus>,
    pub entity_type: Option<EntityType>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A complaint with the complainant's name, hidden for anonymous complaints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminComplaintResponse {
    #[serde(flatten)]
    pub complaint: ComplaintResponse,
    pub complainant_name: Option<String>,
}

impl From<ComplaintWithOwner> for AdminComplaintResponse {
    fn from(row: ComplaintWithOwner) -> Self {
        Self {
            complaint: row.complaint.into(),
            complainant_name: row.owner_name,
        }
    }
}

/// All complaints.
async fn list_complaints(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Query(query): Query<ComplaintListQuery>,
) -> AppResult<ApiResponse<Vec<AdminComplaintResponse>>> {
    let rows = state
        .complaint_service
        .list_all(query.status, query.category, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(rows.into_iter().map(Into::into).collect()))
}

/// Change a complaint's status.
async fn update_complaint_status(
    OfficialUser(official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateComplaintStatusInput>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    let complaint = state
        .complaint_service
        .update_status(&id, input, &official)
        .await?;
    Ok(ApiResponse::ok(complaint.into()))
}

/// All suspicious entity reports.
async fn list_reports(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> AppResult<ApiResponse<Vec<SuspiciousReportResponse>>> {
    let reports = state
        .suspicious_service
        .list_all(query.status, query.entity_type, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Record a verdict on a report.
async fn review_report(
    OfficialUser(official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReviewEntityInput>,
) -> AppResult<ApiResponse<SuspiciousReportResponse>> {
    let report = state
        .suspicious_service
        .review(&id, input, &official)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

#[derive(Debug, Serialize)]
pub struct AlertSent {
    pub recipients: u64,
}

/// Send a security alert to every citizen.
async fn broadcast_alert(
    OfficialUser(official): OfficialUser,
    State(state): State<AppState>,
    Json(input): Json<BroadcastAlertInput>,
) -> AppResult<ApiResponse<AlertSent>> {
    let recipients = state.alert_service.broadcast(input, &official).await?;
    Ok(ApiResponse::created(AlertSent { recipients }))
}

/// Portal-wide counts.
async fn stats(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    Ok(ApiResponse::ok(state.dashboard_service.stats().await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/grievances", get(list_complaints))
        .route("/grievances/{id}/status", put(update_complaint_status))
        .route("/suspicious-entities", get(list_reports))
        .route("/suspicious-entities/{id}/status", put(review_report))
        .route("/alerts", post(broadcast_alert))
        .route("/stats", get(stats))
}
