//! Wire types for the portal REST API.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Citizen,
    Official,
}

/// OTP purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

/// Profile as returned by the server. The Aadhaar number arrives masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub aadhaar_number: String,
    pub phone_number: String,
    pub address: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub government_id: Option<String>,
    pub is_verified: bool,
    pub has_password: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    pub created_at: String,
}

/// The signed-in user and their bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

impl Session {
    #[must_use]
    pub fn is_official(&self) -> bool {
        self.user.role == Role::Official
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub aadhaar_number: String,
    pub phone_number: String,
    pub address: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub requires_otp: bool,
    pub masked_phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSent {
    pub user_id: String,
    pub masked_phone: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Complaint body for `POST /grievance/report`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    pub category: String,
    pub subcategory: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicious_entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_loss: Option<f64>,
    pub urgency_level: UrgencyLevel,
    pub is_anonymous: bool,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub subcategory: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub status_label: String,
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub financial_loss: Option<f64>,
    #[serde(default)]
    pub handled_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub status: String,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub officer: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintDetail {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedComplaint {
    pub complaint_id: String,
    pub complaint: Complaint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Website,
    MobileApp,
    PhoneNumber,
    UpiId,
    SocialMedia,
    Email,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Report body for `POST /suspicious/report`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSuspiciousReport {
    pub entity_type: EntityType,
    pub entity_value: String,
    pub suspicion_reasons: Vec<String>,
    pub description: String,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encountered_where: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousReport {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_value: String,
    pub risk_level: RiskLevel,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportReceipt {
    pub report_id: String,
    pub previous_reports: u64,
    pub report: SuspiciousReport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    #[serde(default)]
    pub complaint_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_complaints: i64,
    pub open_complaints: i64,
    pub resolved_complaints: i64,
    pub complaints_by_status: BTreeMap<String, i64>,
    pub total_suspicious_reports: i64,
    pub suspicious_reports_by_status: BTreeMap<String, i64>,
    pub citizens: u64,
    pub officials: u64,
}
