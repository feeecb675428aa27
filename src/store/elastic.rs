//! Elasticsearch-backed search index for score records.

use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{SearchIndex, StoreError};
use crate::types::ScoreRecord;

/// Writes score records into an Elasticsearch index.
///
/// `base_url` points at the index, e.g. `http://127.0.0.1:9200/pkg-analyzer`.
pub struct ElasticIndex {
    client: Client,
    base_url: String,
}

impl ElasticIndex {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn doc_url(&self, name: &str) -> String {
        format!("{}/_doc/{}", self.base_url, name.replace('/', "%2F"))
    }
}

impl SearchIndex for ElasticIndex {
    async fn put(&self, name: &str, score: &ScoreRecord) -> Result<(), StoreError> {
        debug!(package = name, "indexing score record");

        self.client
            .put(self.doc_url(name))
            .json(score)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        debug!(package = name, "removing index entry");

        let response = self.client.delete(self.doc_url(name)).send().await?;

        // Already absent counts as removed
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        response.error_for_status()?;
        Ok(())
    }
}
