//! # Participant Repository

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use super::alias_group::{delete_orphan_groups, lock_groups_of};
use crate::error::RepositoryError;
use crate::kf_id;
use crate::models::participant::{
    ActiveModel as ParticipantActiveModel, Column, Entity as Participant,
    Model as ParticipantModel,
};
use crate::models::study::Entity as Study;
use crate::pagination::{Page, PageRequest, fetch_page};

/// Request data for creating a participant
#[derive(Debug, Clone, Default)]
pub struct CreateParticipantRequest {
    pub study_id: String,
    pub external_id: Option<String>,
    pub is_proband: Option<bool>,
    pub gender: Option<String>,
}

/// Equality filters accepted by the participant listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantFilter {
    pub study_id: Option<String>,
    pub is_proband: Option<bool>,
    pub gender: Option<String>,
}

impl ParticipantFilter {
    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(self.study_id.as_deref().map(|v| Column::StudyId.eq(v)))
            .add_option(self.is_proband.map(|v| Column::IsProband.eq(v)))
            .add_option(self.gender.as_deref().map(|v| Column::Gender.eq(v)))
    }
}

pub struct ParticipantRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ParticipantRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a participant in an existing study. New participants never
    /// belong to an alias group.
    pub async fn create(
        &self,
        request: CreateParticipantRequest,
    ) -> Result<ParticipantModel, RepositoryError> {
        if Study::find_by_id(request.study_id.clone())
            .one(self.db)
            .await?
            .is_none()
        {
            return Err(RepositoryError::validation_error(format!(
                "Study {} does not exist",
                request.study_id
            )));
        }

        let now = kf_id::now();
        let participant = ParticipantActiveModel {
            kf_id: Set(kf_id::generate(kf_id::PARTICIPANT_PREFIX)),
            uuid: Set(Uuid::new_v4()),
            study_id: Set(request.study_id),
            external_id: Set(request.external_id),
            is_proband: Set(request.is_proband),
            gender: Set(request.gender),
            alias_group_id: Set(None),
            created_at: Set(now),
            modified_at: Set(now),
        };

        let participant = participant.insert(self.db).await?;
        tracing::debug!(kf_id = %participant.kf_id, study_id = %participant.study_id, "Created participant");
        Ok(participant)
    }

    pub async fn get(&self, kf_id: &str) -> Result<ParticipantModel, RepositoryError> {
        Participant::find_by_id(kf_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Participant", kf_id))
    }

    pub async fn list(
        &self,
        filter: &ParticipantFilter,
        request: &PageRequest,
    ) -> Result<Page<ParticipantModel>, RepositoryError> {
        let select = Participant::find().filter(filter.condition());
        Ok(fetch_page(self.db, select, &request.cursor, request.limit).await?)
    }

    /// Deletes a participant; its alias group goes with it if it was the last
    /// member.
    pub async fn delete(&self, kf_id: &str) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let participant = Participant::find_by_id(kf_id.to_string())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Participant", kf_id))?;
        lock_groups_of(&txn, [&participant]).await?;

        participant.delete(&txn).await?;
        let swept = delete_orphan_groups(&txn).await?;

        txn.commit().await?;

        tracing::info!(kf_id, alias_groups_deleted = swept, "Deleted participant");
        Ok(())
    }
}
