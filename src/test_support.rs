//! Shared fixtures for in-crate database tests.

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::db::{init_pool, run_migrations};
use crate::models::study::Model as StudyModel;
use crate::repositories::study::{CreateStudyRequest, StudyRepository};

/// A fresh in-memory SQLite database with the schema applied.
///
/// The pool holds a single connection; every connection to `sqlite::memory:`
/// would otherwise see its own empty database.
pub async fn setup_db() -> DatabaseConnection {
    let config = AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        ..Default::default()
    };

    let db = init_pool(&config).await.expect("Failed to init test DB");
    run_migrations(&db).await.expect("Failed to migrate test DB");
    db
}

pub async fn create_study(db: &DatabaseConnection) -> StudyModel {
    StudyRepository::new(db)
        .create(CreateStudyRequest {
            external_id: format!("phs{:06}", rand::random::<u32>() % 1_000_000),
            ..Default::default()
        })
        .await
        .expect("Failed to create study")
}
