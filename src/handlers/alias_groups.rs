//! Alias group endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::types::ListResponse;
use crate::models::{alias_group, participant};
use crate::pagination::{PageRequest, PaginationQuery};
use crate::repositories::AliasGroupRepository;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct AliasGroupResponse {
    pub kf_id: String,
    pub uuid: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
    /// Member kf_ids; omitted from list results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
}

impl AliasGroupResponse {
    pub fn with_members(group: alias_group::Model, members: Vec<participant::Model>) -> Self {
        let mut response = Self::from(group);
        response.participants = Some(members.into_iter().map(|p| p.kf_id).collect());
        response
    }
}

impl From<alias_group::Model> for AliasGroupResponse {
    fn from(model: alias_group::Model) -> Self {
        Self {
            kf_id: model.kf_id,
            uuid: model.uuid,
            created_at: model.created_at,
            modified_at: model.modified_at,
            participants: None,
        }
    }
}

pub async fn list_alias_groups(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<AliasGroupResponse>>, ApiError> {
    let request = PageRequest::from_query(&query, &state.config.pagination);
    let page = AliasGroupRepository::new(&state.db).list(&request).await?;
    Ok(Json(ListResponse::from_page(page, "/alias-groups", &[])))
}

pub async fn get_alias_group(
    State(state): State<AppState>,
    Path(kf_id): Path<String>,
) -> Result<Json<AliasGroupResponse>, ApiError> {
    let repo = AliasGroupRepository::new(&state.db);
    let group = repo.get(&kf_id).await?;
    let members = repo.members(&group.kf_id).await?;
    Ok(Json(AliasGroupResponse::with_members(group, members)))
}

/// Removes a participant from a group. Responds 204 when that emptied and
/// deleted the group, otherwise with the remaining group.
pub async fn remove_alias_group_member(
    State(state): State<AppState>,
    Path((kf_id, participant_kf_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let repo = AliasGroupRepository::new(&state.db);
    match repo.remove_member(&kf_id, &participant_kf_id).await? {
        Some(group) => {
            let members = repo.members(&group.kf_id).await?;
            Ok(Json(AliasGroupResponse::with_members(group, members)).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
