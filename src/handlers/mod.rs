//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Data Service.

pub mod alias_groups;
pub mod genomic_files;
pub mod participants;
pub mod studies;
pub mod types;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::db;
use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Root handler that returns basic service information
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health of the service's dependencies
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub service: ServiceInfo,
    pub database: &'static str,
}

/// Reports whether the database is reachable.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::warn!(error = %err, "Status check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database is unreachable",
        )
    })?;
    Ok(Json(StatusResponse {
        service: ServiceInfo::default(),
        database: "ok",
    }))
}
