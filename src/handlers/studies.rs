//! Study endpoints.

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
use crate::models::study;
use crate::pagination::{PageRequest, PaginationQuery};
use crate::repositories::StudyRepository;
use crate::repositories::study::CreateStudyRequest;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct StudyResponse {
    pub kf_id: String,
    pub uuid: Uuid,
    pub external_id: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
}

impl From<study::Model> for StudyResponse {
    fn from(model: study::Model) -> Self {
        Self {
            kf_id: model.kf_id,
            uuid: model.uuid,
            external_id: model.external_id,
            name: model.name,
            short_name: model.short_name,
            created_at: model.created_at,
            modified_at: model.modified_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStudyBody {
    pub external_id: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

pub async fn list_studies(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<StudyResponse>>, ApiError> {
    let request = PageRequest::from_query(&query, &state.config.pagination);
    let page = StudyRepository::new(&state.db).list(&request).await?;
    Ok(Json(ListResponse::from_page(page, "/studies", &[])))
}

pub async fn create_study(
    State(state): State<AppState>,
    payload: Result<Json<CreateStudyBody>, JsonRejection>,
) -> Result<(StatusCode, Json<StudyResponse>), ApiError> {
    let Json(body) = payload?;
    let study = StudyRepository::new(&state.db)
        .create(CreateStudyRequest {
            external_id: body.external_id,
            name: body.name,
            short_name: body.short_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(study.into())))
}

pub async fn get_study(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<Json<StudyResponse>, ApiError> {
    let study = StudyRepository::new(&state.db).get(&kf_id).await?;
    Ok(Json(study.into()))
}

pub async fn delete_study(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    StudyRepository::new(&state.db).delete(&kf_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
