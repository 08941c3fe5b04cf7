use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ENTITY_TYPES: [&str; 4] = ["capability", "use case", "tool", "product"];
const RELATIONSHIP_TYPES: [&str; 6] = [
    "enables",
    "implemented by",
    "uses",
    "supports",
    "powered by",
    "delivers",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Entities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entities::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Entities::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Entities::Type)
                            .string_len(50)
                            .not_null()
                            .check(Expr::col(Entities::Type).is_in(ENTITY_TYPES)),
                    )
                    .col(ColumnDef::new(Entities::Description).text())
                    .col(ColumnDef::new(Entities::Metadata).json())
                    .col(ColumnDef::new(Entities::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Entities::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Relationships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Relationships::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Relationships::SourceId).integer().not_null())
                    .col(ColumnDef::new(Relationships::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(Relationships::RelationshipType)
                            .string_len(50)
                            .not_null()
                            .check(Expr::col(Relationships::RelationshipType).is_in(RELATIONSHIP_TYPES)),
                    )
                    .col(ColumnDef::new(Relationships::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relationships_source_id")
                            .from(Relationships::Table, Relationships::SourceId)
                            .to(Entities::Table, Entities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relationships_target_id")
                            .from(Relationships::Table, Relationships::TargetId)
                            .to(Entities::Table, Entities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relationships_unique_triple")
                    .table(Relationships::Table)
                    .col(Relationships::SourceId)
                    .col(Relationships::TargetId)
                    .col(Relationships::RelationshipType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relationships_target_id")
                    .table(Relationships::Table)
                    .col(Relationships::TargetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Tags::Name).string_len(50).not_null().unique_key())
                    .col(ColumnDef::new(Tags::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EntityTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EntityTags::EntityId).integer().not_null())
                    .col(ColumnDef::new(EntityTags::TagId).integer().not_null())
                    .col(ColumnDef::new(EntityTags::CreatedAt).timestamp_with_time_zone().not_null())
                    .primary_key(
                        Index::create()
                            .col(EntityTags::EntityId)
                            .col(EntityTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_tags_entity_id")
                            .from(EntityTags::Table, EntityTags::EntityId)
                            .to(Entities::Table, Entities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_tags_tag_id")
                            .from(EntityTags::Table, EntityTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditLog::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(AuditLog::AdminUser).string_len(50).not_null())
                    .col(ColumnDef::new(AuditLog::AdminRole).string_len(20).not_null())
                    .col(ColumnDef::new(AuditLog::ActionType).string_len(50).not_null())
                    .col(ColumnDef::new(AuditLog::EntityType).string_len(50))
                    .col(ColumnDef::new(AuditLog::EntityId).integer())
                    .col(ColumnDef::new(AuditLog::Details).json())
                    .col(ColumnDef::new(AuditLog::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_created_at")
                    .table(AuditLog::Table)
                    .col(AuditLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EntityTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Relationships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entities::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Entities {
    Table,
    Id,
    Name,
    Type,
    Description,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Relationships {
    Table,
    Id,
    SourceId,
    TargetId,
    RelationshipType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EntityTags {
    Table,
    EntityId,
    TagId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLog {
    Table,
    Id,
    AdminUser,
    AdminRole,
    ActionType,
    EntityType,
    EntityId,
    Details,
    CreatedAt,
}
