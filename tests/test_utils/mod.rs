//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with migrations applied, and seeds
//! fixture rows through the public repositories.

use anyhow::Result;
use dataservice::repositories::StudyRepository;
use dataservice::repositories::study::CreateStudyRequest;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is pinned to a single connection so every query sees the same
/// in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Creates a study with a random external id and returns its kf_id.
#[allow(dead_code)]
pub async fn create_test_study(db: &DatabaseConnection) -> Result<String> {
    let study = StudyRepository::new(db)
        .create(CreateStudyRequest {
            external_id: format!("phs-{}", Uuid::new_v4()),
            ..Default::default()
        })
        .await?;
    Ok(study.kf_id)
}
