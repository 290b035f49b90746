//! # Server Configuration
//!
//! This module contains the router, shared state and server startup for the
//! Data Service.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers::{self, alias_groups, genomic_files, participants, studies};
use crate::indexd::{DocumentIndex, HttpDocumentIndex};
use crate::telemetry::{self, TRACE_ID_HEADER, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub indexd: Arc<dyn DocumentIndex>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/status", get(handlers::status))
        .route(
            "/studies",
            get(studies::list_studies).post(studies::create_study),
        )
        .route(
            "/studies/{kf_id}",
            get(studies::get_study).delete(studies::delete_study),
        )
        .route(
            "/participants",
            get(participants::list_participants).post(participants::create_participant),
        )
        .route(
            "/participants/{kf_id}",
            get(participants::get_participant).delete(participants::delete_participant),
        )
        .route(
            "/participants/{kf_id}/aliases",
            get(participants::list_aliases),
        )
        .route(
            "/participants/{kf_id}/aliases/{other_kf_id}",
            post(participants::link_alias),
        )
        .route("/alias-groups", get(alias_groups::list_alias_groups))
        .route("/alias-groups/{kf_id}", get(alias_groups::get_alias_group))
        .route(
            "/alias-groups/{kf_id}/participants/{participant_kf_id}",
            delete(alias_groups::remove_alias_group_member),
        )
        .route(
            "/genomic-files",
            get(genomic_files::list_genomic_files).post(genomic_files::create_genomic_file),
        )
        .route(
            "/genomic-files/{kf_id}",
            get(genomic_files::get_genomic_file).delete(genomic_files::delete_genomic_file),
        )
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Scopes each request to a trace id taken from `x-request-id` (or freshly
/// generated) and echoes it on the response.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext::from_header(
        request
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
    );
    let trace_id = context.trace_id.clone();
    request.extensions_mut().insert(context.clone());

    let mut response = telemetry::with_trace_context(context, next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let indexd = HttpDocumentIndex::new(&config.indexd)?;
    let config = Arc::new(config);
    let state = AppState {
        config: Arc::clone(&config),
        db,
        indexd: Arc::new(indexd),
    };
    let app = create_app(state);

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
