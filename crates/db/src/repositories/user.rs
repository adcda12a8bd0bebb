//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use chrono::Utc;
use cyberguard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by Aadhaar number.
    pub async fn find_by_aadhaar(&self, aadhaar_number: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::AadhaarNumber.eq(aadhaar_number))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by session token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// A registration racing another with the same Aadhaar number loses on the
    /// unique index and gets `Conflict`.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(insert_error)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Drop the session token of whoever holds it.
    pub async fn clear_token(&self, token: &str) -> AppResult<u64> {
        let result = User::update_many()
            .filter(user::Column::Token.eq(token))
            .col_expr(user::Column::Token, sea_orm::sea_query::Expr::value(Option::<String>::None))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Record a successful login: new token and last login time.
    pub async fn record_login(&self, user: user::Model, token: String) -> AppResult<user::Model> {
        let now = Utc::now();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token));
        active.last_login_at = Set(Some(now.into()));
        active.updated_at = Set(Some(now.into()));
        self.update(active).await
    }

    /// Count users with the given role.
    pub async fn count_by_role(&self, role: user::UserRole) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Role.eq(role))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of every user with the given role.
    pub async fn find_ids_by_role(&self, role: user::UserRole) -> AppResult<Vec<String>> {
        User::find()
            .select_only()
            .column(user::Column::Id)
            .filter(user::Column::Role.eq(role))
            .order_by_asc(user::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User with this Aadhaar number already exists".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}
