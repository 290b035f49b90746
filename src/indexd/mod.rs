//! # Document Index
//!
//! Genomic files keep their urls, hashes and sizes in indexd, an external
//! versioned document store keyed by content id (`did`). Documents can be
//! deleted there out-of-band, so every page of document-backed rows must be
//! checked for liveness before it is returned.

pub mod http;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpDocumentIndex;

/// Failures talking to the document index. All of them are fatal for the
/// request that triggered the lookup.
#[derive(Debug, Error)]
pub enum IndexdError {
    #[error("indexd request for {did} failed: {source}")]
    Transport {
        did: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("indexd returned unexpected status {status} for {did}")]
    UnexpectedStatus { did: String, status: u16 },
    #[error("indexd url cannot address document {did}")]
    InvalidUrl { did: String },
    #[error("invalid indexd base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("failed to build indexd client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Liveness lookups against the document index.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Returns `true` when the document has been deleted from the index.
    async fn is_deleted(&self, did: &str) -> Result<bool, IndexdError>;

    /// Resolves a batch of documents, returning the ids that are deleted.
    ///
    /// The first failure aborts the batch.
    async fn deleted_among(&self, dids: &[&str]) -> Result<HashSet<String>, IndexdError> {
        let mut deleted = HashSet::new();
        for did in dids {
            if self.is_deleted(did).await? {
                deleted.insert((*did).to_string());
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process index with a fixed set of deleted documents.
    #[derive(Debug, Default)]
    pub struct StubDocumentIndex {
        deleted: HashSet<String>,
        unavailable: bool,
        lookups: AtomicUsize,
    }

    impl StubDocumentIndex {
        pub fn with_deleted<I, S>(dids: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                deleted: dids.into_iter().map(Into::into).collect(),
                ..Default::default()
            }
        }

        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Default::default()
            }
        }

        pub fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentIndex for StubDocumentIndex {
        async fn is_deleted(&self, did: &str) -> Result<bool, IndexdError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(IndexdError::UnexpectedStatus {
                    did: did.to_string(),
                    status: 503,
                });
            }
            Ok(self.deleted.contains(did))
        }
    }

    #[tokio::test]
    async fn test_deleted_among_returns_only_deleted_ids() {
        let index = StubDocumentIndex::with_deleted(["did-2", "did-4"]);

        let deleted = index
            .deleted_among(&["did-1", "did-2", "did-3", "did-4"])
            .await
            .unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains("did-2"));
        assert!(deleted.contains("did-4"));
        assert_eq!(index.lookups(), 4);
    }

    #[tokio::test]
    async fn test_deleted_among_stops_at_first_failure() {
        let index = StubDocumentIndex::unavailable();

        let result = index.deleted_among(&["did-1", "did-2"]).await;

        assert!(matches!(
            result,
            Err(IndexdError::UnexpectedStatus { status: 503, .. })
        ));
        assert_eq!(index.lookups(), 1);
    }
}
