//! Genomic file endpoints. Reads hide files whose indexd document is deleted.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::types::ListResponse;
use crate::models::genomic_file;
use crate::pagination::{PageRequest, PaginationQuery};
use crate::repositories::GenomicFileRepository;
use crate::repositories::genomic_file::{CreateGenomicFileRequest, GenomicFileFilter};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct GenomicFileResponse {
    pub kf_id: String,
    pub uuid: Uuid,
    pub latest_did: String,
    pub study_id: Option<String>,
    pub file_name: Option<String>,
    pub data_type: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
}

impl From<genomic_file::Model> for GenomicFileResponse {
    fn from(model: genomic_file::Model) -> Self {
        Self {
            kf_id: model.kf_id,
            uuid: model.uuid,
            latest_did: model.latest_did,
            study_id: model.study_id,
            file_name: model.file_name,
            data_type: model.data_type,
            created_at: model.created_at,
            modified_at: model.modified_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateGenomicFileBody {
    pub latest_did: String,
    pub study_id: Option<String>,
    pub file_name: Option<String>,
    pub data_type: Option<String>,
}

fn repository(state: &AppState) -> GenomicFileRepository<'_> {
    GenomicFileRepository::new(
        &state.db,
        state.indexd.as_ref(),
        state.config.indexd.max_backfill_rounds,
    )
}

pub async fn list_genomic_files(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
    Query(filter): Query<GenomicFileFilter>,
) -> Result<Json<ListResponse<GenomicFileResponse>>, ApiError> {
    let request = PageRequest::from_query(&query, &state.config.pagination);
    let page = repository(&state).list(&filter, &request).await?;

    let filters = [
        ("study_id", filter.study_id.clone()),
        ("data_type", filter.data_type.clone()),
    ];
    Ok(Json(ListResponse::from_page(page, "/genomic-files", &filters)))
}

pub async fn create_genomic_file(
    State(state): State<AppState>,
    payload: Result<Json<CreateGenomicFileBody>, JsonRejection>,
) -> Result<(StatusCode, Json<GenomicFileResponse>), ApiError> {
    let Json(body) = payload?;
    let file = repository(&state)
        .create(CreateGenomicFileRequest {
            latest_did: body.latest_did,
            study_id: body.study_id,
            file_name: body.file_name,
            data_type: body.data_type,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(file.into())))
}

pub async fn get_genomic_file(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<Json<GenomicFileResponse>, ApiError> {
    let file = repository(&state).get(&kf_id).await?;
    Ok(Json(file.into()))
}

pub async fn delete_genomic_file(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repository(&state).delete(&kf_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
