//! Complaint timeline entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::complaint::ComplaintStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub complaint_id: String,

    /// Status the complaint moved into
    pub status: ComplaintStatus,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Name of the handling officer, NULL for system entries
    #[sea_orm(nullable)]
    pub officer: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complaint::Entity",
        from = "Column::ComplaintId",
        to = "super::complaint::Column::Id",
        on_delete = "Cascade"
    )]
    Complaint,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
