//! Alias group entity model
//!
//! Participants that are the same individual under different studies share an
//! alias group. A group exists only while at least one participant
//! references it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::pagination::{Cursor, KeysetEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alias_groups")]
pub struct Model {
    /// Kids First identifier, `AG_` prefixed
    #[sea_orm(primary_key, auto_increment = false)]
    pub kf_id: String,

    #[sea_orm(unique)]
    pub uuid: Uuid,

    pub created_at: DateTimeWithTimeZone,

    pub modified_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participant::Entity")]
    Participant,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
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
