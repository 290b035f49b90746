//! Study entity model
//!
//! A study owns its participants and genomic files; deleting it cascades to
//! both.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::pagination::{Cursor, KeysetEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "studies")]
pub struct Model {
    /// Kids First identifier, `SD_` prefixed
    #[sea_orm(primary_key, auto_increment = false)]
    pub kf_id: String,

    /// Secondary key; the pagination tie-breaker
    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Identifier assigned by the submitting institution
    pub external_id: String,

    pub name: Option<String>,

    pub short_name: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub modified_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participant::Entity")]
    Participant,
    #[sea_orm(has_many = "super::genomic_file::Entity")]
    GenomicFile,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
    }
}

impl Related<super::genomic_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenomicFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl KeysetEntity for Entity {
    fn created_at_column() -> Column {
        Column::CreatedAt
    }

    fn uuid_column() -> Column {
        Column::Uuid
    }

    fn cursor_of(model: &Model) -> Cursor {
        Cursor::from_row(&model.created_at, model.uuid)
    }
}
