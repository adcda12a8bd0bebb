//! Suspicious entity report.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of thing being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    #[sea_orm(string_value = "website")]
    Website,
    #[sea_orm(string_value = "mobile_app")]
    MobileApp,
    #[sea_orm(string_value = "phone_number")]
    PhoneNumber,
    #[sea_orm(string_value = "upi_id")]
    UpiId,
    #[sea_orm(string_value = "social_media")]
    SocialMedia,
    #[sea_orm(string_value = "email")]
    Email,
}

impl EntityType {
    /// Name shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Website => "Website/URL",
            Self::MobileApp => "Mobile App",
            Self::PhoneNumber => "Phone Number",
            Self::UpiId => "UPI ID",
            Self::SocialMedia => "Social Media Profile",
            Self::Email => "Email Address",
        }
    }
}

/// Assessed or claimed risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

/// Review state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EntityReportStatus {
    #[sea_orm(string_value = "under_analysis")]
    #[default]
    UnderAnalysis,
    #[sea_orm(string_value = "verified_threat")]
    VerifiedThreat,
    #[sea_orm(string_value = "false_positive")]
    FalsePositive,
    #[sea_orm(string_value = "blocked")]
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suspicious_entity")]
pub struct Model {
    /// `SR` + timestamp
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Reporter
    pub user_id: String,

    pub entity_type: EntityType,

    /// Normalized value (URL, phone number, UPI handle, ...)
    pub entity_value: String,

    /// JSON array of suspicion reasons
    #[sea_orm(column_type = "JsonBinary")]
    pub suspicion_reasons: Json,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub risk_level: RiskLevel,

    #[sea_orm(nullable)]
    pub encountered_where: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub additional_info: Option<String>,

    pub status: EntityReportStatus,

    /// Evidence references as a JSON array of strings
    #[sea_orm(column_type = "JsonBinary")]
    pub evidence: Json,

    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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
