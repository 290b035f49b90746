//! # Data Models
//!
//! SeaORM entities for the catalog tables.

use serde::{Deserialize, Serialize};

pub mod alias_group;
pub mod genomic_file;
pub mod participant;
pub mod study;

pub use alias_group::Entity as AliasGroup;
pub use genomic_file::Entity as GenomicFile;
pub use participant::Entity as Participant;
pub use study::Entity as Study;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "dataservice".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
