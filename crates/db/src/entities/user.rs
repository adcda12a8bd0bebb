//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "citizen")]
    #[default]
    Citizen,
    #[sea_orm(string_value = "official")]
    Official,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// `CG` + 6 uppercase alphanumerics
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// 12-digit national ID
    #[sea_orm(unique)]
    pub aadhaar_number: String,

    /// 10-digit mobile number, OTPs go here
    pub phone_number: String,

    #[sea_orm(column_type = "Text")]
    pub address: String,

    pub role: UserRole,

    /// Required for officials
    #[sea_orm(nullable)]
    pub government_id: Option<String>,

    /// Argon2 PHC string. NULL until the password step is completed.
    #[sea_orm(nullable)]
    pub password_hash: Option<String>,

    /// Set once the registration OTP has been confirmed
    #[sea_orm(default_value = false)]
    pub is_verified: bool,

    /// Bearer token of the current session
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    #[sea_orm(nullable)]
    pub last_login_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this account may use the admin endpoints.
    #[must_use]
    pub fn is_official(&self) -> bool {
        self.role == UserRole::Official
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complaint::Entity")]
    Complaints,

    #[sea_orm(has_many = "super::suspicious_entity::Entity")]
    SuspiciousEntities,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaints.def()
    }
}

impl Related<super::suspicious_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SuspiciousEntities.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
