//! Complaint (grievance) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Complaint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "submitted")]
    #[default]
    Submitted,
    #[sea_orm(string_value = "acknowledged")]
    Acknowledged,
    #[sea_orm(string_value = "under_investigation")]
    UnderInvestigation,
    #[sea_orm(string_value = "evidence_review")]
    EvidenceReview,
    #[sea_orm(string_value = "action_taken")]
    ActionTaken,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ComplaintStatus {
    /// Label shown on the timeline.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Acknowledged => "Acknowledged",
            Self::UnderInvestigation => "Under Investigation",
            Self::EvidenceReview => "Evidence Review",
            Self::ActionTaken => "Action Taken",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }

    /// Resolved and rejected complaints are closed for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// How urgently the complainant needs a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
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

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint")]
pub struct Model {
    /// `CR` + timestamp
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Complainant
    pub user_id: String,

    pub category: String,

    pub subcategory: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(nullable)]
    pub incident_date: Option<Date>,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    /// Phone number, URL, UPI ID, etc. named by the complainant
    #[sea_orm(nullable)]
    pub suspicious_entity: Option<String>,

    /// Amount lost in rupees (financial categories only)
    #[sea_orm(column_type = "Double", nullable)]
    pub financial_loss: Option<f64>,

    pub urgency_level: UrgencyLevel,

    #[sea_orm(default_value = false)]
    pub is_anonymous: bool,

    pub status: ComplaintStatus,

    /// Evidence references as a JSON array of strings
    #[sea_orm(column_type = "JsonBinary")]
    pub evidence: Json,

    /// Official who last changed the status
    #[sea_orm(nullable)]
    pub handled_by: Option<String>,

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

    #[sea_orm(has_many = "super::complaint_event::Entity")]
    Events,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::complaint_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
