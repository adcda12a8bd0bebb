//! Create suspicious entity report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SuspiciousEntity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SuspiciousEntity::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SuspiciousEntity::UserId)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspiciousEntity::EntityType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspiciousEntity::EntityValue)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspiciousEntity::SuspicionReasons)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SuspiciousEntity::Description).text().not_null())
                    .col(
                        ColumnDef::new(SuspiciousEntity::RiskLevel)
                            .string_len(16)
                            .not_null()
                            .default("medium"),
                    )
                    .col(ColumnDef::new(SuspiciousEntity::EncounteredWhere).string_len(256))
                    .col(ColumnDef::new(SuspiciousEntity::AdditionalInfo).text())
                    .col(
                        ColumnDef::new(SuspiciousEntity::Status)
                            .string_len(32)
                            .not_null()
                            .default("under_analysis"),
                    )
                    .col(
                        ColumnDef::new(SuspiciousEntity::Evidence)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(SuspiciousEntity::ReviewedBy).string_len(16))
                    .col(
                        ColumnDef::new(SuspiciousEntity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SuspiciousEntity::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_suspicious_entity_user")
                            .from(SuspiciousEntity::Table, SuspiciousEntity::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_suspicious_entity_user_id")
                    .table(SuspiciousEntity::Table)
                    .col(SuspiciousEntity::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: (entity_type, entity_value) (for repeat-offender lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_suspicious_entity_type_value")
                    .table(SuspiciousEntity::Table)
                    .col(SuspiciousEntity::EntityType)
                    .col(SuspiciousEntity::EntityValue)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SuspiciousEntity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SuspiciousEntity {
    Table,
    Id,
    UserId,
    EntityType,
    EntityValue,
    SuspicionReasons,
    Description,
    RiskLevel,
    EncounteredWhere,
    AdditionalInfo,
    Status,
    Evidence,
    ReviewedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
