//! OTP challenge repository.

use std::sync::Arc;

use crate::entities::{OtpChallenge, otp_challenge};
use chrono::Utc;
use cyberguard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// OTP challenge repository for database operations.
#[derive(Clone)]
pub struct OtpChallengeRepository {
    db: Arc<DatabaseConnection>,
}

impl OtpChallengeRepository {
    /// Create a new OTP challenge repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a new challenge.
    pub async fn create(
        &self,
        model: otp_challenge::ActiveModel,
    ) -> AppResult<otp_challenge::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Consume a challenge if it is still open.
    ///
    /// Returns `false` when another request consumed it first.
    pub async fn consume(&self, id: &str) -> AppResult<bool> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = OtpChallenge::update_many()
            .filter(otp_challenge::Column::Id.eq(id))
            .filter(otp_challenge::Column::ConsumedAt.is_null())
            .col_expr(otp_challenge::Column::ConsumedAt, Expr::value(now))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Count a wrong guess against an open challenge, consuming it when `burn`.
    pub async fn record_failure(&self, id: &str, burn: bool) -> AppResult<()> {
        let mut update = OtpChallenge::update_many()
            .filter(otp_challenge::Column::Id.eq(id))
            .filter(otp_challenge::Column::ConsumedAt.is_null())
            .col_expr(
                otp_challenge::Column::Attempts,
                Expr::col(otp_challenge::Column::Attempts).add(1),
            );
        if burn {
            let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
            update = update.col_expr(otp_challenge::Column::ConsumedAt, Expr::value(now));
        }

        update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Latest unconsumed challenge for this user and purpose.
    pub async fn find_active(
        &self,
        user_id: &str,
        purpose: otp_challenge::OtpPurpose,
    ) -> AppResult<Option<otp_challenge::Model>> {
        OtpChallenge::find()
            .filter(otp_challenge::Column::UserId.eq(user_id))
            .filter(otp_challenge::Column::Purpose.eq(purpose))
            .filter(otp_challenge::Column::ConsumedAt.is_null())
            .order_by_desc(otp_challenge::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Consume every open challenge for this user and purpose.
    pub async fn consume_all(
        &self,
        user_id: &str,
        purpose: otp_challenge::OtpPurpose,
    ) -> AppResult<u64> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = OtpChallenge::update_many()
            .filter(otp_challenge::Column::UserId.eq(user_id))
            .filter(otp_challenge::Column::Purpose.eq(purpose))
            .filter(otp_challenge::Column::ConsumedAt.is_null())
            .col_expr(otp_challenge::Column::ConsumedAt, Expr::value(now))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
