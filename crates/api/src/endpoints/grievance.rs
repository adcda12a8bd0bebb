//! Complaint (grievance) endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use chrono::NaiveDate;
use cyberguard_common::AppResult;
use cyberguard_core::{ComplaintDetail, SubmitComplaintInput, require_self_or_official};
use cyberguard_db::entities::{
    complaint::{self, ComplaintStatus, UrgencyLevel},
    complaint_event,
};
use serde::Serialize;

use crate::{
    extractors::AuthUser, middleware::AppState, rate_limit::rate_limit_report_middleware,
    response::ApiResponse,
};

/// Complaint response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub subcategory: String,
    pub title: String,
    pub description: String,
    pub incident_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub suspicious_entity: Option<String>,
    pub financial_loss: Option<f64>,
    pub urgency_level: UrgencyLevel,
    pub is_anonymous: bool,
    pub status: ComplaintStatus,
    pub status_label: &'static str,
    pub evidence: serde_json::Value,
    pub handled_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<complaint::Model> for ComplaintResponse {
    fn from(c: complaint::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            category: c.category,
            subcategory: c.subcategory,
            title: c.title,
            description: c.description,
            incident_date: c.incident_date,
            location: c.location,
            suspicious_entity: c.suspicious_entity,
            financial_loss: c.financial_loss,
            urgency_level: c.urgency_level,
            is_anonymous: c.is_anonymous,
            status: c.status,
            status_label: c.status.label(),
            evidence: c.evidence,
            handled_by: c.handled_by,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// One timeline entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntryResponse {
    pub status: ComplaintStatus,
    pub label: &'static str,
    pub description: String,
    pub officer: Option<String>,
    pub timestamp: String,
}

impl From<complaint_event::Model> for TimelineEntryResponse {
    fn from(e: complaint_event::Model) -> Self {
        Self {
            status: e.status,
            label: e.status.label(),
            description: e.description,
            officer: e.officer,
            timestamp: e.created_at.to_rfc3339(),
        }
    }
}

/// Complaint with its timeline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintDetailResponse {
    #[serde(flatten)]
    pub complaint: ComplaintResponse,
    pub timeline: Vec<TimelineEntryResponse>,
}

impl From<ComplaintDetail> for ComplaintDetailResponse {
    fn from(detail: ComplaintDetail) -> Self {
        Self {
            complaint: detail.complaint.into(),
            timeline: detail.timeline.into_iter().map(Into::into).collect(),
        }
    }
}

/// Submit response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitComplaintResponse {
    pub complaint_id: String,
    pub complaint: ComplaintResponse,
}

/// File a complaint.
async fn report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitComplaintInput>,
) -> AppResult<ApiResponse<SubmitComplaintResponse>> {
    let complaint = state.complaint_service.submit(&user, input).await?;

    Ok(ApiResponse::created(SubmitComplaintResponse {
        complaint_id: complaint.id.clone(),
        complaint: complaint.into(),
    }))
}

/// Complaints filed by a user.
async fn list_for_user(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    require_self_or_official(&viewer, &user_id)?;

    let complaints = state.complaint_service.list_for_user(&user_id).await?;
    Ok(ApiResponse::ok(
        complaints.into_iter().map(Into::into).collect(),
    ))
}

/// One complaint with its timeline.
async fn show(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ComplaintDetailResponse>> {
    let detail = state
        .complaint_service
        .get_with_timeline(&id, &viewer)
        .await?;
    Ok(ApiResponse::ok(detail.into()))
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
        .route("/{id}", get(show))
}
