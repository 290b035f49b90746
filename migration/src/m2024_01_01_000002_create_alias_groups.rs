//! Migration to create the alias_groups table.
//!
//! An alias group is an equivalence class of participants that describe the
//! same person. Membership lives on `participants.alias_group_id`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AliasGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AliasGroups::KfId)
                            .string_len(11)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AliasGroups::Uuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AliasGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AliasGroups::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alias_groups_created_at_uuid")
                    .table(AliasGroups::Table)
                    .col(AliasGroups::CreatedAt)
                    .col(AliasGroups::Uuid)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_alias_groups_created_at_uuid")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AliasGroups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AliasGroups {
    Table,
    KfId,
    Uuid,
    CreatedAt,
    ModifiedAt,
}
