//! # Study Repository
//!
//! CRUD for studies. Deleting a study removes its participants and genomic
//! files in the same transaction, then sweeps any alias groups left without
//! members.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::alias_group::{delete_orphan_groups, lock_groups_of};
use crate::error::RepositoryError;
use crate::kf_id;
use crate::models::study::{ActiveModel as StudyActiveModel, Entity as Study, Model as StudyModel};
use crate::models::{genomic_file, participant};
use crate::pagination::{Page, PageRequest, fetch_page};

/// Request data for creating a study
#[derive(Debug, Clone, Default)]
pub struct CreateStudyRequest {
    pub external_id: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

pub struct StudyRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> StudyRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: CreateStudyRequest) -> Result<StudyModel, RepositoryError> {
        if request.external_id.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Study external_id cannot be empty",
            ));
        }

        let now = kf_id::now();
        let study = StudyActiveModel {
            kf_id: Set(kf_id::generate(kf_id::STUDY_PREFIX)),
            uuid: Set(Uuid::new_v4()),
            external_id: Set(request.external_id),
            name: Set(request.name),
            short_name: Set(request.short_name),
            created_at: Set(now),
            modified_at: Set(now),
        };

        let study = study
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(kf_id = %study.kf_id, "Created study");
        Ok(study)
    }

    pub async fn get(&self, kf_id: &str) -> Result<StudyModel, RepositoryError> {
        Study::find_by_id(kf_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Study", kf_id))
    }

    pub async fn list(&self, request: &PageRequest) -> Result<Page<StudyModel>, RepositoryError> {
        Ok(fetch_page(self.db, Study::find(), &request.cursor, request.limit).await?)
    }

    /// Deletes a study together with everything it owns.
    pub async fn delete(&self, kf_id: &str) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let study = Study::find_by_id(kf_id.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Study", kf_id))?;

        let members = participant::Entity::find()
            .filter(participant::Column::StudyId.eq(study.kf_id.as_str()))
            .order_by_asc(participant::Column::KfId)
            .lock_exclusive()
            .all(&txn)
            .await?;
        lock_groups_of(&txn, &members).await?;

        let files = genomic_file::Entity::delete_many()
            .filter(genomic_file::Column::StudyId.eq(study.kf_id.as_str()))
            .exec(&txn)
            .await?;
        let participants = participant::Entity::delete_many()
            .filter(participant::Column::StudyId.eq(study.kf_id.as_str()))
            .exec(&txn)
            .await?;
        study.delete(&txn).await?;
        let groups = delete_orphan_groups(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            kf_id,
            participants = participants.rows_affected,
            genomic_files = files.rows_affected,
            alias_groups = groups,
            "Deleted study"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::alias_group::AliasGroupRepository;
    use crate::repositories::participant::{CreateParticipantRequest, ParticipantRepository};
    use crate::test_support::setup_db;
    use crate::models::AliasGroup;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_create_and_get_study() {
        let db = setup_db().await;
        let repo = StudyRepository::new(&db);

        let study = repo
            .create(CreateStudyRequest {
                external_id: "phs001138".to_string(),
                name: Some("Congenital Heart Defects".to_string()),
                short_name: None,
            })
            .await
            .unwrap();

        assert!(study.kf_id.starts_with("SD_"));
        assert_eq!(repo.get(&study.kf_id).await.unwrap(), study);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_external_id() {
        let db = setup_db().await;
        let result = StudyRepository::new(&db)
            .create(CreateStudyRequest {
                external_id: "  ".to_string(),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_missing_study() {
        let db = setup_db().await;
        let result = StudyRepository::new(&db).get("SD_00000000").await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_study_removes_participants_and_orphaned_groups() {
        let db = setup_db().await;
        let studies = StudyRepository::new(&db);
        let participants = ParticipantRepository::new(&db);
        let groups = AliasGroupRepository::new(&db);

        let doomed = studies
            .create(CreateStudyRequest {
                external_id: "doomed".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let kept = studies
            .create(CreateStudyRequest {
                external_id: "kept".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let new_participant = |study_id: &str| CreateParticipantRequest {
            study_id: study_id.to_string(),
            ..Default::default()
        };
        let a = participants.create(new_participant(&doomed.kf_id)).await.unwrap();
        let b = participants.create(new_participant(&doomed.kf_id)).await.unwrap();
        let c = participants.create(new_participant(&doomed.kf_id)).await.unwrap();
        let d = participants.create(new_participant(&kept.kf_id)).await.unwrap();

        // a-b only live in the doomed study; c-d spans both.
        let orphaned = groups.link(&a.kf_id, &b.kf_id).await.unwrap();
        let surviving = groups.link(&c.kf_id, &d.kf_id).await.unwrap();

        studies.delete(&doomed.kf_id).await.unwrap();

        assert!(matches!(
            studies.get(&doomed.kf_id).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            groups.get(&orphaned.kf_id).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert_eq!(groups.get(&surviving.kf_id).await.unwrap(), surviving);
        assert!(groups.aliases_of(&d.kf_id).await.unwrap().is_empty());
        assert_eq!(AliasGroup::find().count(&db).await.unwrap(), 1);
        assert_eq!(participant::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_study() {
        let db = setup_db().await;
        let result = StudyRepository::new(&db).delete("SD_00000000").await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
