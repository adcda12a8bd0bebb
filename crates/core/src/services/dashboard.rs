//! Counts for the officials' dashboard.

use std::collections::BTreeMap;

use cyberguard_common::AppResult;
use cyberguard_db::{
    entities::{complaint::ComplaintStatus, suspicious_entity::EntityReportStatus, user::UserRole},
    repositories::{ComplaintRepository, SuspiciousEntityRepository, UserRepository},
};
use serde::Serialize;

/// Aggregate figures across the portal.
#[derive(Debug, Clone, Default, Serialize)]
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

/// Dashboard service.
#[derive(Clone)]
pub struct DashboardService {
    user_repo: UserRepository,
    complaint_repo: ComplaintRepository,
    entity_repo: SuspiciousEntityRepository,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        complaint_repo: ComplaintRepository,
        entity_repo: SuspiciousEntityRepository,
    ) -> Self {
        Self {
            user_repo,
            complaint_repo,
            entity_repo,
        }
    }

    /// Compute current figures.
    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let mut stats = DashboardStats::default();

        for (status, count) in self.complaint_repo.count_by_status().await? {
            stats.total_complaints += count;
            match status {
                ComplaintStatus::Resolved => stats.resolved_complaints += count,
                s if !s.is_terminal() => stats.open_complaints += count,
                _ => {}
            }
            stats
                .complaints_by_status
                .insert(complaint_status_key(status).to_string(), count);
        }

        for (status, count) in self.entity_repo.count_by_status().await? {
            stats.total_suspicious_reports += count;
            stats
                .suspicious_reports_by_status
                .insert(report_status_key(status).to_string(), count);
        }

        stats.citizens = self.user_repo.count_by_role(UserRole::Citizen).await?;
        stats.officials = self.user_repo.count_by_role(UserRole::Official).await?;

        Ok(stats)
    }
}

const fn complaint_status_key(status: ComplaintStatus) -> &'static str {
    match status {
        ComplaintStatus::Submitted => "submitted",
        ComplaintStatus::Acknowledged => "acknowledged",
        ComplaintStatus::UnderInvestigation => "under_investigation",
        ComplaintStatus::EvidenceReview => "evidence_review",
        ComplaintStatus::ActionTaken => "action_taken",
        ComplaintStatus::Resolved => "resolved",
        ComplaintStatus::Rejected => "rejected",
    }
}

const fn report_status_key(status: EntityReportStatus) -> &'static str {
    match status {
        EntityReportStatus::UnderAnalysis => "under_analysis",
        EntityReportStatus::VerifiedThreat => "verified_threat",
        EntityReportStatus::FalsePositive => "false_positive",
        EntityReportStatus::Blocked => "blocked",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn row(status: &str, count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("status", Value::String(Some(Box::new(status.to_string())))),
            ("total", Value::BigInt(Some(count))),
        ])
    }

    fn count(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_stats() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                row("submitted", 3),
                row("under_investigation", 2),
                row("resolved", 4),
                row("rejected", 1),
            ]])
            .append_query_results([vec![row("under_analysis", 5), row("blocked", 2)]])
            .append_query_results([[count(40)]])
            .append_query_results([[count(3)]]);
        let conn = Arc::new(db.into_connection());
        let service = DashboardService::new(
            UserRepository::new(conn.clone()),
            ComplaintRepository::new(conn.clone()),
            SuspiciousEntityRepository::new(conn),
        );

        let stats = service.stats().await.unwrap();

        assert_eq!(stats.total_complaints, 10);
        assert_eq!(stats.open_complaints, 5);
        assert_eq!(stats.resolved_complaints, 4);
        assert_eq!(stats.complaints_by_status["rejected"], 1);
        assert_eq!(stats.total_suspicious_reports, 7);
        assert_eq!(stats.citizens, 40);
        assert_eq!(stats.officials, 3);
    }
}
