//! CouchDB-backed document store for analysis records.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{DocumentStore, StoreError};
use crate::types::Analysis;

/// Stores one analysis document per package in a CouchDB database.
///
/// `base_url` points at the database, e.g. `http://127.0.0.1:5984/pkg-analyzer`.
pub struct CouchStore {
    client: Client,
    base_url: String,
}

impl CouchStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn doc_url(&self, name: &str) -> String {
        // Scoped package names carry a slash
        format!("{}/{}", self.base_url, name.replace('/', "%2F"))
    }

    /// Revision of the current document, if one exists. Needed for CouchDB's
    /// optimistic concurrency on update.
    async fn current_rev(&self, name: &str) -> Result<Option<String>, StoreError> {
        let response = self.client.get(self.doc_url(name)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: Value = response.error_for_status()?.json().await?;
        Ok(doc
            .get("_rev")
            .and_then(Value::as_str)
            .map(String::from))
    }
}

impl DocumentStore for CouchStore {
    async fn get(&self, name: &str) -> Result<Analysis, StoreError> {
        let response = self.client.get(self.doc_url(name)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(name.to_string()));
        }

        Ok(response.error_for_status()?.json().await?)
    }

    async fn put(&self, name: &str, analysis: &Analysis) -> Result<(), StoreError> {
        let mut doc = serde_json::to_value(analysis)?;

        if let Some(rev) = self.current_rev(name).await? {
            doc["_rev"] = Value::String(rev);
        }

        debug!(package = name, "storing analysis document");

        self.client
            .put(self.doc_url(name))
            .json(&doc)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_url_encodes_scoped_names() {
        let store = CouchStore::new("http://127.0.0.1:5984/pkg-analyzer/");
        assert_eq!(
            store.doc_url("@types/node"),
            "http://127.0.0.1:5984/pkg-analyzer/@types%2Fnode"
        );
    }
}
