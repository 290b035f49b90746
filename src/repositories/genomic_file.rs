//! # Genomic File Repository
//!
//! Genomic files are document-backed: a row whose indexd document has been
//! deleted is invisible to reads even though it is still stored. Listing goes
//! through the backfilling pager; single fetches check the document directly.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::indexd::DocumentIndex;
use crate::kf_id;
use crate::models::genomic_file::{
    ActiveModel as GenomicFileActiveModel, Column, Entity as GenomicFile,
    Model as GenomicFileModel,
};
use crate::models::study::Entity as Study;
use crate::pagination::{Page, PageRequest, fetch_live_page};

/// Request data for registering a genomic file
#[derive(Debug, Clone, Default)]
pub struct CreateGenomicFileRequest {
    pub latest_did: String,
    pub study_id: Option<String>,
    pub file_name: Option<String>,
    pub data_type: Option<String>,
}

/// Equality filters accepted by the genomic file listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenomicFileFilter {
    pub study_id: Option<String>,
    pub data_type: Option<String>,
}

impl GenomicFileFilter {
    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(self.study_id.as_deref().map(|v| Column::StudyId.eq(v)))
            .add_option(self.data_type.as_deref().map(|v| Column::DataType.eq(v)))
    }
}

pub struct GenomicFileRepository<'a> {
    db: &'a DatabaseConnection,
    index: &'a dyn DocumentIndex,
    max_backfill_rounds: u32,
}

impl<'a> GenomicFileRepository<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        index: &'a dyn DocumentIndex,
        max_backfill_rounds: u32,
    ) -> Self {
        Self {
            db,
            index,
            max_backfill_rounds,
        }
    }

    pub async fn create(
        &self,
        request: CreateGenomicFileRequest,
    ) -> Result<GenomicFileModel, RepositoryError> {
        if request.latest_did.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Genomic file latest_did cannot be empty",
            ));
        }

        if let Some(study_id) = request.study_id.as_deref() {
            let study = Study::find_by_id(study_id.to_string()).one(self.db).await?;
            if study.is_none() {
                return Err(RepositoryError::validation_error(format!(
                    "Study {} does not exist",
                    study_id
                )));
            }
        }

        let now = kf_id::now();
        let file = GenomicFileActiveModel {
            kf_id: Set(kf_id::generate(kf_id::GENOMIC_FILE_PREFIX)),
            uuid: Set(Uuid::new_v4()),
            latest_did: Set(request.latest_did),
            study_id: Set(request.study_id),
            file_name: Set(request.file_name),
            data_type: Set(request.data_type),
            created_at: Set(now),
            modified_at: Set(now),
        };

        Ok(file.insert(self.db).await?)
    }

    /// Fetches a genomic file whose document is still live.
    pub async fn get(&self, kf_id: &str) -> Result<GenomicFileModel, RepositoryError> {
        let file = GenomicFile::find_by_id(kf_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("GenomicFile", kf_id))?;

        if self.index.is_deleted(&file.latest_did).await? {
            tracing::debug!(kf_id, did = %file.latest_did, "Genomic file document was deleted");
            return Err(RepositoryError::not_found("GenomicFile", kf_id));
        }

        Ok(file)
    }

    pub async fn list(
        &self,
        filter: &GenomicFileFilter,
        request: &PageRequest,
    ) -> Result<Page<GenomicFileModel>, RepositoryError> {
        let select = GenomicFile::find().filter(filter.condition());
        fetch_live_page(
            self.db,
            self.index,
            select,
            &request.cursor,
            request.limit,
            self.max_backfill_rounds,
        )
        .await
    }

    /// Removes the row; the indexd document is left alone.
    pub async fn delete(&self, kf_id: &str) -> Result<(), RepositoryError> {
        let file = GenomicFile::find_by_id(kf_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("GenomicFile", kf_id))?;

        file.delete(self.db).await?;
        Ok(())
    }
}
