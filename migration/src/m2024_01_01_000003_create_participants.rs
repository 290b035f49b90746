//! Migration to create the participants table.
//!
//! Participants cascade away with their study. The alias group reference is
//! nulled if a group row is ever removed underneath it; the application deletes
//! groups only once they are empty.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::KfId)
                            .string_len(11)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::Uuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Participants::StudyId).string_len(11).not_null())
                    .col(ColumnDef::new(Participants::ExternalId).text().null())
                    .col(ColumnDef::new(Participants::IsProband).boolean().null())
                    .col(ColumnDef::new(Participants::Gender).text().null())
                    .col(
                        ColumnDef::new(Participants::AliasGroupId)
                            .string_len(11)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Participants::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_study_id")
                            .from(Participants::Table, Participants::StudyId)
                            .to(Studies::Table, Studies::KfId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_alias_group_id")
                            .from(Participants::Table, Participants::AliasGroupId)
                            .to(AliasGroups::Table, AliasGroups::KfId)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_participants_created_at_uuid")
                    .table(Participants::Table)
                    .col(Participants::CreatedAt)
                    .col(Participants::Uuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_participants_alias_group_id")
                    .table(Participants::Table)
                    .col(Participants::AliasGroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_participants_alias_group_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_participants_created_at_uuid")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Participants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Participants {
    Table,
    KfId,
    Uuid,
    StudyId,
    ExternalId,
    IsProband,
    Gender,
    AliasGroupId,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum Studies {
    Table,
    KfId,
}

#[derive(DeriveIden)]
enum AliasGroups {
    Table,
    KfId,
}
