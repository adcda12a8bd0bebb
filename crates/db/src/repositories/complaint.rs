//! Complaint repository.

use std::sync::Arc;

use crate::entities::{Complaint, ComplaintEvent, User, complaint, complaint_event, user};
use cyberguard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, sea_query::Expr,
};

/// Filter for the official complaint queue.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    pub status: Option<complaint::ComplaintStatus>,
    pub category: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Complaint repository for database operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a complaint by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint::Model>> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a complaint by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<complaint::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// Insert a complaint together with its first timeline entry.
    pub async fn create_with_event(
        &self,
        model: complaint::ActiveModel,
        event: complaint_event::ActiveModel,
    ) -> AppResult<complaint::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        event
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Apply `changes` to a complaint still in status `expected` and append a
    /// timeline entry, in one transaction.
    ///
    /// Fails with `Conflict` when the status moved since the caller read it.
    pub async fn update_status_with_event(
        &self,
        id: &str,
        expected: complaint::ComplaintStatus,
        changes: complaint::ActiveModel,
        event: complaint_event::ActiveModel,
    ) -> AppResult<complaint::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = Complaint::update_many()
            .set(changes)
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(expected))
            .exec_with_returning(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Conflict(format!("Complaint {id} was updated by someone else"))
            })?;
        event
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Complaints filed by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::UserId.eq(user_id))
            .order_by_desc(complaint::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Timeline of a complaint, oldest first.
    pub async fn find_events(&self, complaint_id: &str) -> AppResult<Vec<complaint_event::Model>> {
        ComplaintEvent::find()
            .filter(complaint_event::Column::ComplaintId.eq(complaint_id))
            .order_by_asc(complaint_event::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All complaints with their complainant, newest first.
    pub async fn find_all_with_user(
        &self,
        filter: &ComplaintFilter,
    ) -> AppResult<Vec<(complaint::Model, Option<user::Model>)>> {
        let mut query = Complaint::find()
            .find_also_related(User)
            .order_by_desc(complaint::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(complaint::Column::Status.eq(status));
        }
        if let Some(category) = &filter.category {
            query = query.filter(complaint::Column::Category.eq(category.as_str()));
        }

        query
            .limit(filter.limit)
            .offset(filter.offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of complaints per status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(complaint::ComplaintStatus, i64)>> {
        Complaint::find()
            .select_only()
            .column(complaint::Column::Status)
            .column_as(Expr::col(complaint::Column::Id).count(), "total")
            .group_by(complaint::Column::Status)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
