//! Participant endpoints, including alias linking.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::alias_groups::AliasGroupResponse;
use crate::handlers::types::ListResponse;
use crate::models::participant;
use crate::pagination::{PageRequest, PaginationQuery};
use crate::repositories::participant::{CreateParticipantRequest, ParticipantFilter};
use crate::repositories::{AliasGroupRepository, ParticipantRepository};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub kf_id: String,
    pub uuid: Uuid,
    pub study_id: String,
    pub external_id: Option<String>,
    pub is_proband: Option<bool>,
    pub gender: Option<String>,
    pub alias_group_id: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
}

impl From<participant::Model> for ParticipantResponse {
    fn from(model: participant::Model) -> Self {
        Self {
            kf_id: model.kf_id,
            uuid: model.uuid,
            study_id: model.study_id,
            external_id: model.external_id,
            is_proband: model.is_proband,
            gender: model.gender,
            alias_group_id: model.alias_group_id,
            created_at: model.created_at,
            modified_at: model.modified_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateParticipantBody {
    pub study_id: String,
    pub external_id: Option<String>,
    pub is_proband: Option<bool>,
    pub gender: Option<String>,
}

/// Participants sharing an alias group with `kf_id`.
#[derive(Debug, Serialize)]
pub struct AliasesResponse {
    pub kf_id: String,
    pub results: Vec<ParticipantResponse>,
}

pub async fn list_participants(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
    Query(filter): Query<ParticipantFilter>,
) -> Result<Json<ListResponse<ParticipantResponse>>, ApiError> {
    let request = PageRequest::from_query(&query, &state.config.pagination);
    let page = ParticipantRepository::new(&state.db)
        .list(&filter, &request)
        .await?;

    let filters = [
        ("study_id", filter.study_id.clone()),
        ("is_proband", filter.is_proband.map(|v| v.to_string())),
        ("gender", filter.gender.clone()),
    ];
    Ok(Json(ListResponse::from_page(page, "/participants", &filters)))
}

pub async fn create_participant(
    State(state): State<AppState>,
    payload: Result<Json<CreateParticipantBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ParticipantResponse>), ApiError> {
    let Json(body) = payload?;
    let participant = ParticipantRepository::new(&state.db)
        .create(CreateParticipantRequest {
            study_id: body.study_id,
            external_id: body.external_id,
            is_proband: body.is_proband,
            gender: body.gender,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(participant.into())))
}

pub async fn get_participant(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<Json<ParticipantResponse>, ApiError> {
    let participant = ParticipantRepository::new(&state.db).get(&kf_id).await?;
    Ok(Json(participant.into()))
}

pub async fn delete_participant(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ParticipantRepository::new(&state.db).delete(&kf_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Links two participants as aliases and returns the resulting group.
pub async fn link_alias(
    State(state): State<AppState>,
    Path((kf_id, other_kf_id)): Path<(String, String)>,
) -> Result<Json<AliasGroupResponse>, ApiError> {
    let repo = AliasGroupRepository::new(&state.db);
    let group = repo.link(&kf_id, &other_kf_id).await?;
    let members = repo.members(&group.kf_id).await?;
    Ok(Json(AliasGroupResponse::with_members(group, members)))
}

pub async fn list_aliases(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<Json<AliasesResponse>, ApiError> {
    let aliases = AliasGroupRepository::new(&state.db)
        .aliases_of(&kf_id)
        .await?;
    Ok(Json(AliasesResponse {
        kf_id,
        results: aliases.into_iter().map(Into::into).collect(),
    }))
}
