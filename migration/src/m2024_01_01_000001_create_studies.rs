//! Migration to create the studies table.
//!
//! Studies are the root of the catalog; participants reference them by `kf_id`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Studies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Studies::KfId)
                            .string_len(11)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Studies::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Studies::ExternalId).text().not_null())
                    .col(ColumnDef::new(Studies::Name).text().null())
                    .col(ColumnDef::new(Studies::ShortName).text().null())
                    .col(
                        ColumnDef::new(Studies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Studies::ModifiedAt)
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
                    .name("idx_studies_created_at_uuid")
                    .table(Studies::Table)
                    .col(Studies::CreatedAt)
                    .col(Studies::Uuid)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_studies_created_at_uuid").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Studies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Studies {
    Table,
    KfId,
    Uuid,
    ExternalId,
    Name,
    ShortName,
    CreatedAt,
    ModifiedAt,
}
