//! Migration to create the genomic_files table.
//!
//! Genomic files are document-backed: `latest_did` points at the indexd record
//! holding the file's urls, hashes and size.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GenomicFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GenomicFiles::KfId)
                            .string_len(11)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GenomicFiles::Uuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GenomicFiles::LatestDid).text().not_null())
                    .col(ColumnDef::new(GenomicFiles::StudyId).string_len(11).null())
                    .col(ColumnDef::new(GenomicFiles::FileName).text().null())
                    .col(ColumnDef::new(GenomicFiles::DataType).text().null())
                    .col(
                        ColumnDef::new(GenomicFiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(GenomicFiles::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_genomic_files_study_id")
                            .from(GenomicFiles::Table, GenomicFiles::StudyId)
                            .to(Studies::Table, Studies::KfId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_genomic_files_created_at_uuid")
                    .table(GenomicFiles::Table)
                    .col(GenomicFiles::CreatedAt)
                    .col(GenomicFiles::Uuid)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_genomic_files_created_at_uuid")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(GenomicFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GenomicFiles {
    Table,
    KfId,
    Uuid,
    LatestDid,
    StudyId,
    FileName,
    DataType,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum Studies {
    Table,
    KfId,
}
