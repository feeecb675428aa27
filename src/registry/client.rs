//! npm-style registry client.

use std::future::Future;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::error::RegistryError;
use crate::types::ManifestMap;

const NPM_REGISTRY: &str = "https://registry.npmjs.org";

/// Read-only source of raw package documents.
///
/// The document is consumed as an opaque structured record; the pipeline
/// never writes back to the registry.
pub trait Registry: Send + Sync {
    /// Fetches the full package document for `name`.
    fn get_document(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ManifestMap, RegistryError>> + Send;
}

/// Registry client speaking the npm packument protocol.
pub struct NpmRegistry {
    client: Client,
    base_url: String,
}

impl NpmRegistry {
    pub fn new() -> Self {
        Self::with_base_url(NPM_REGISTRY.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for NpmRegistry {
    async fn get_document(&self, name: &str) -> Result<ManifestMap, RegistryError> {
        // Scoped names carry a slash that must survive as one path segment
        let url = format!("{}/{}", self.base_url, name.replace('/', "%2F"));
        debug!(package = name, url = %url, "fetching registry document");

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PackageNotFound(name.to_string()));
        }

        let document: Value = response.error_for_status()?.json().await?;

        document
            .as_object()
            .cloned()
            .ok_or_else(|| RegistryError::InvalidDocument(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let registry = NpmRegistry::with_base_url("https://registry.example.org/".to_string());
        assert_eq!(registry.base_url, "https://registry.example.org");
    }

    // Live-network test, run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_get_document_cross_spawn() {
        let registry = NpmRegistry::new();
        let doc = registry.get_document("cross-spawn").await.unwrap();

        assert_eq!(doc.get("name").and_then(Value::as_str), Some("cross-spawn"));
        assert!(doc.contains_key("versions"));
    }
}
