//! # Repository Layer
//!
//! Repositories encapsulate the SeaORM operations behind each resource.
//! Multi-row mutations (alias linking, cascading deletes) run inside a single
//! transaction.

pub mod alias_group;
pub mod genomic_file;
pub mod participant;
pub mod study;

pub use alias_group::AliasGroupRepository;
pub use genomic_file::GenomicFileRepository;
pub use participant::ParticipantRepository;
pub use study::StudyRepository;
