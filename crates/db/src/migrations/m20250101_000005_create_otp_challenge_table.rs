//! Create OTP challenge table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpChallenge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpChallenge::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpChallenge::UserId).string_len(16).not_null())
                    .col(ColumnDef::new(OtpChallenge::Purpose).string_len(32).not_null())
                    .col(ColumnDef::new(OtpChallenge::CodeHash).string_len(256).not_null())
                    .col(
                        ColumnDef::new(OtpChallenge::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OtpChallenge::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OtpChallenge::ConsumedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(OtpChallenge::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_otp_challenge_user")
                            .from(OtpChallenge::Table, OtpChallenge::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, purpose) (for the active challenge lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_otp_challenge_user_purpose")
                    .table(OtpChallenge::Table)
                    .col(OtpChallenge::UserId)
                    .col(OtpChallenge::Purpose)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpChallenge::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OtpChallenge {
    Table,
    Id,
    UserId,
    Purpose,
    CodeHash,
    Attempts,
    ExpiresAt,
    ConsumedAt,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
