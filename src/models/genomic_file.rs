//! Genomic file entity model
//!
//! File metadata lives in indexd; this row only tracks the latest document
//! id (`latest_did`) plus a few descriptive columns. Whether the document is
//! still live is decided by indexd at read time.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::pagination::{Cursor, DocumentBacked, KeysetEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "genomic_files")]
pub struct Model {
    /// Kids First identifier, `GF_` prefixed
    #[sea_orm(primary_key, auto_increment = false)]
    pub kf_id: String,

    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Indexd document id of the current file version
    #[sea_orm(column_type = "Text")]
    pub latest_did: String,

    pub study_id: Option<String>,

    pub file_name: Option<String>,

    pub data_type: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub modified_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::study::Entity",
        from = "Column::StudyId",
        to = "super::study::Column::KfId",
        on_delete = "Cascade"
    )]
    Study,
}

impl Related<super::study::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Study.def()
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

impl DocumentBacked for Entity {
    fn document_id(model: &Model) -> &str {
        &model.latest_did
    }
}
