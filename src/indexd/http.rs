//! HTTP client for the indexd `index` collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use super::{DocumentIndex, IndexdError};
use crate::config::IndexdConfig;

/// Looks documents up with `GET {base}/{did}`. A `404` means the document was
/// deleted; any other non-success status is an error.
#[derive(Debug, Clone)]
pub struct HttpDocumentIndex {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpDocumentIndex {
    pub fn new(config: &IndexdConfig) -> Result<Self, IndexdError> {
        let base_url =
            Url::parse(&config.url).map_err(|_| IndexdError::InvalidBaseUrl(config.url.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(IndexdError::Client)?;

        Ok(Self { client, base_url })
    }

    fn document_url(&self, did: &str) -> Result<Url, IndexdError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IndexdError::InvalidUrl {
                did: did.to_string(),
            })?
            .pop_if_empty()
            .push(did);
        Ok(url)
    }
}

#[async_trait]
impl DocumentIndex for HttpDocumentIndex {
    async fn is_deleted(&self, did: &str) -> Result<bool, IndexdError> {
        let url = self.document_url(did)?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| IndexdError::Transport {
                did: did.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(did, "Document no longer present in indexd");
                Ok(true)
            }
            status if status.is_success() => Ok(false),
            status => Err(IndexdError::UnexpectedStatus {
                did: did.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
