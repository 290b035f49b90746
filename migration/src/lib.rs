//! Database migrations for the Data Service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_01_01_000001_create_studies;
mod m2024_01_01_000002_create_alias_groups;
mod m2024_01_01_000003_create_participants;
mod m2024_01_01_000004_create_genomic_files;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_01_01_000001_create_studies::Migration),
            Box::new(m2024_01_01_000002_create_alias_groups::Migration),
            Box::new(m2024_01_01_000003_create_participants::Migration),
            Box::new(m2024_01_01_000004_create_genomic_files::Migration),
        ]
    }
}
