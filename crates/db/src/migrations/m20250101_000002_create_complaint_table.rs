//! Create complaint and complaint event tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaint::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Complaint::UserId).string_len(16).not_null())
                    .col(ColumnDef::new(Complaint::Category).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Complaint::Subcategory)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Complaint::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Complaint::Description).text().not_null())
                    .col(ColumnDef::new(Complaint::IncidentDate).date())
                    .col(ColumnDef::new(Complaint::Location).string_len(256))
                    .col(ColumnDef::new(Complaint::SuspiciousEntity).string_len(256))
                    .col(ColumnDef::new(Complaint::FinancialLoss).double())
                    .col(
                        ColumnDef::new(Complaint::UrgencyLevel)
                            .string_len(16)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(Complaint::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Complaint::Status)
                            .string_len(32)
                            .not_null()
                            .default("submitted"),
                    )
                    .col(
                        ColumnDef::new(Complaint::Evidence)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Complaint::HandledBy).string_len(16))
                    .col(
                        ColumnDef::new(Complaint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Complaint::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_user")
                            .from(Complaint::Table, Complaint::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) (for "my complaints", newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_user_id_created_at")
                    .table(Complaint::Table)
                    .col(Complaint::UserId)
                    .col(Complaint::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: status (for the admin queue and stats)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_status")
                    .table(Complaint::Table)
                    .col(Complaint::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComplaintEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintEvent::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ComplaintEvent::ComplaintId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintEvent::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComplaintEvent::Description).text().not_null())
                    .col(ColumnDef::new(ComplaintEvent::Officer).string_len(128))
                    .col(
                        ColumnDef::new(ComplaintEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_event_complaint")
                            .from(ComplaintEvent::Table, ComplaintEvent::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_event_complaint_id")
                    .table(ComplaintEvent::Table)
                    .col(ComplaintEvent::ComplaintId)
                    .col(ComplaintEvent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplaintEvent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Complaint::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
    UserId,
    Category,
    Subcategory,
    Title,
    Description,
    IncidentDate,
    Location,
    SuspiciousEntity,
    FinancialLoss,
    UrgencyLevel,
    IsAnonymous,
    Status,
    Evidence,
    HandledBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ComplaintEvent {
    Table,
    Id,
    ComplaintId,
    Status,
    Description,
    Officer,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
