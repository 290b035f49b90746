//! # Data Service Library
//!
//! Catalog service for studies, participants and genomic files: keyset
//! pagination with indexd-aware backfill, and participant alias groups.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod indexd;
pub mod kf_id;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;

#[cfg(test)]
pub(crate) mod test_support;
