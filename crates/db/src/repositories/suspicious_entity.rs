//! Suspicious entity report repository.

use std::sync::Arc;

use crate::entities::{SuspiciousEntity, suspicious_entity};
use cyberguard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Filter for the official review queue.
#[derive(Debug, Clone, Default)]
pub struct SuspiciousEntityFilter {
    pub status: Option<suspicious_entity::EntityReportStatus>,
    pub entity_type: Option<suspicious_entity::EntityType>,
    pub limit: u64,
    pub offset: u64,
}

/// Suspicious entity repository for database operations.
#[derive(Clone)]
pub struct SuspiciousEntityRepository {
    db: Arc<DatabaseConnection>,
}

impl SuspiciousEntityRepository {
    /// Create a new suspicious entity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<suspicious_entity::Model>> {
        SuspiciousEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new report.
    pub async fn create(
        &self,
        model: suspicious_entity::ActiveModel,
    ) -> AppResult<suspicious_entity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply `changes` to a report still in status `expected`.
    ///
    /// Fails with `Conflict` when another reviewer got there first.
    pub async fn update_from_status(
        &self,
        id: &str,
        expected: suspicious_entity::EntityReportStatus,
        changes: suspicious_entity::ActiveModel,
    ) -> AppResult<suspicious_entity::Model> {
        SuspiciousEntity::update_many()
            .set(changes)
            .filter(suspicious_entity::Column::Id.eq(id))
            .filter(suspicious_entity::Column::Status.eq(expected))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Conflict(format!("Report {id} has already been reviewed")))
    }

    /// Reports filed by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<suspicious_entity::Model>> {
        SuspiciousEntity::find()
            .filter(suspicious_entity::Column::UserId.eq(user_id))
            .order_by_desc(suspicious_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All reports, newest first.
    pub async fn find_all(
        &self,
        filter: &SuspiciousEntityFilter,
    ) -> AppResult<Vec<suspicious_entity::Model>> {
        let mut query =
            SuspiciousEntity::find().order_by_desc(suspicious_entity::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(suspicious_entity::Column::Status.eq(status));
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(suspicious_entity::Column::EntityType.eq(entity_type));
        }

        query
            .limit(filter.limit)
            .offset(filter.offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// How many times this exact value has been reported before.
    pub async fn count_reports_for_value(
        &self,
        entity_type: suspicious_entity::EntityType,
        entity_value: &str,
    ) -> AppResult<u64> {
        SuspiciousEntity::find()
            .filter(suspicious_entity::Column::EntityType.eq(entity_type))
            .filter(suspicious_entity::Column::EntityValue.eq(entity_value))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of reports per status.
    pub async fn count_by_status(
        &self,
    ) -> AppResult<Vec<(suspicious_entity::EntityReportStatus, i64)>> {
        SuspiciousEntity::find()
            .select_only()
            .column(suspicious_entity::Column::Status)
            .column_as(Expr::col(suspicious_entity::Column::Id).count(), "total")
            .group_by(suspicious_entity::Column::Status)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
