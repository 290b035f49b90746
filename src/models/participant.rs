//! Participant entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::pagination::{Cursor, KeysetEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    /// Kids First identifier, `PT_` prefixed
    #[sea_orm(primary_key, auto_increment = false)]
    pub kf_id: String,

    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Owning study
    pub study_id: String,

    pub external_id: Option<String>,

    pub is_proband: Option<bool>,

    pub gender: Option<String>,

    /// Alias group shared with this participant's aliases, if any
    pub alias_group_id: Option<String>,

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
    #[sea_orm(
        belongs_to = "super::alias_group::Entity",
        from = "Column::AliasGroupId",
        to = "super::alias_group::Column::KfId",
        on_delete = "SetNull"
    )]
    AliasGroup,
}

impl Related<super::study::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Study.def()
    }
}

impl Related<super::alias_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AliasGroup.def()
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
