//! One-time password challenge.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a challenge unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    #[sea_orm(string_value = "registration")]
    Registration,
    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otp_challenge")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub purpose: OtpPurpose,

    /// Argon2 hash of the 6-digit code
    pub code_hash: String,

    /// Wrong guesses so far
    #[sea_orm(default_value = 0)]
    pub attempts: i32,

    pub expires_at: DateTimeWithTimeZone,

    /// Set when used or superseded; a consumed challenge never verifies again
    #[sea_orm(nullable)]
    pub consumed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
