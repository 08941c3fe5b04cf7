use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminUsers::Username).string_len(50).not_null().primary_key())
                    .col(ColumnDef::new(AdminUsers::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(AdminUsers::Role)
                            .string_len(20)
                            .not_null()
                            .check(Expr::col(AdminUsers::Role).is_in(["admin", "super_admin"])),
                    )
                    .col(ColumnDef::new(AdminUsers::FailedAttempts).integer().not_null().default(0))
                    .col(ColumnDef::new(AdminUsers::LastFailedAttempt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdminUsers::AccountLocked).boolean().not_null().default(false))
                    .col(ColumnDef::new(AdminUsers::LastLoginAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdminUsers::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(AdminUsers::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminSessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminSessions::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(AdminSessions::SessionId).string().not_null().unique_key())
                    .col(ColumnDef::new(AdminSessions::Username).string_len(50).not_null())
                    .col(ColumnDef::new(AdminSessions::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(AdminSessions::ExpiresAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(AdminSessions::IsActive).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_sessions_username")
                            .from(AdminSessions::Table, AdminSessions::Username)
                            .to(AdminUsers::Table, AdminUsers::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_sessions_username")
                    .table(AdminSessions::Table)
                    .col(AdminSessions::Username)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminUsers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AdminUsers {
    Table,
    Username,
    PasswordHash,
    Role,
    FailedAttempts,
    LastFailedAttempt,
    AccountLocked,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AdminSessions {
    Table,
    Id,
    SessionId,
    Username,
    CreatedAt,
    ExpiresAt,
    IsActive,
}
