//! Archive fetcher: bounded tarball download, extraction and manifest merge.
//!
//! The fetcher never retries internally; retryable failures are surfaced to
//! the caller, and a fresh working directory per call keeps retries free of
//! partial state.

mod extract;
mod limit;
mod merge;

pub use limit::ByteCeiling;
pub use merge::fill_missing;

use std::fs;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::types::{FetchError, ManifestMap, PackageDescriptor};

/// Default download ceiling in bytes.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 262_144_000;

/// Conventional manifest path inside the working directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Result of one fetch.
#[derive(Debug)]
pub struct FetchResult {
    /// Working directory holding the extracted tree plus the merged manifest.
    pub dir: PathBuf,
    /// The archive's own manifest, unmerged. Ground truth for fields the
    /// registry may have gotten wrong.
    pub manifest: ManifestMap,
}

/// Downloads and extracts package archives with a byte-size ceiling.
pub struct Fetcher {
    client: Client,
    max_archive_size: u64,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_max_archive_size(DEFAULT_MAX_ARCHIVE_SIZE)
    }

    pub fn with_max_archive_size(max_archive_size: u64) -> Self {
        Self {
            client: Client::new(),
            max_archive_size,
        }
    }

    /// Fetches the archive for `descriptor` into `target`.
    ///
    /// Manifest fields found in the archive but missing from the descriptor
    /// are filled into the descriptor in place and written to
    /// `target/package.json`; fields the registry already supplied win.
    pub async fn fetch(
        &self,
        descriptor: &mut PackageDescriptor,
        target: &Path,
    ) -> Result<FetchResult, FetchError> {
        let Some(url) = descriptor.tarball_url.clone() else {
            debug!(package = %descriptor.name, "no archive location, writing registry manifest only");
            return self.without_archive(descriptor, target);
        };

        let Some(body) = self.download(&descriptor.name, &url).await? else {
            // Stale or missing archive link is not an error
            return self.without_archive(descriptor, target);
        };

        extract::extract_tarball(&body, target)?;
        self.resolve_and_merge(descriptor, target)
    }

    /// Streams the archive body, enforcing the size ceiling.
    ///
    /// Returns `None` on 404 so the caller can proceed as if the descriptor
    /// had no archive location.
    async fn download(&self, name: &str, url: &str) -> Result<Option<Vec<u8>>, FetchError> {
        debug!(package = name, url, "downloading archive");

        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(package = name, "archive missing upstream, proceeding without it");
            return Ok(None);
        }

        let response = response.error_for_status()?;

        let mut ceiling = ByteCeiling::new(self.max_archive_size);
        if let Some(declared) = response.content_length() {
            ceiling.check_declared(declared)?;
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            // Erroring out here drops the stream, aborting the transfer
            ceiling.count(chunk.len())?;
            body.extend_from_slice(&chunk);
        }

        Ok(Some(body))
    }

    fn without_archive(
        &self,
        descriptor: &PackageDescriptor,
        target: &Path,
    ) -> Result<FetchResult, FetchError> {
        write_manifest(target, &descriptor.manifest)?;

        Ok(FetchResult {
            dir: target.to_path_buf(),
            manifest: descriptor.manifest.clone(),
        })
    }

    fn resolve_and_merge(
        &self,
        descriptor: &mut PackageDescriptor,
        target: &Path,
    ) -> Result<FetchResult, FetchError> {
        // A missing or corrupt inner manifest degrades to empty rather than
        // failing the whole fetch
        let resolved = read_manifest(target).unwrap_or_default();

        let copied = merge::fill_missing(&mut descriptor.manifest, &resolved);
        if !copied.is_empty() {
            debug!(package = %descriptor.name, fields = ?copied, "filled manifest fields from archive");
        }

        write_manifest(target, &descriptor.manifest)?;

        Ok(FetchResult {
            dir: target.to_path_buf(),
            manifest: resolved,
        })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn read_manifest(dir: &Path) -> Option<ManifestMap> {
    let raw = fs::read(dir.join(MANIFEST_FILE)).ok()?;
    serde_json::from_slice::<serde_json::Value>(&raw)
        .ok()?
        .as_object()
        .cloned()
}

fn write_manifest(dir: &Path, manifest: &ManifestMap) -> Result<(), FetchError> {
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(manifest)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a local port, closing the
    /// connection afterwards.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Read the request head before responding
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }

            socket.write_all(&response).await.unwrap();
            socket.flush().await.unwrap();
        });

        format!("http://{addr}")
    }

    fn descriptor(manifest: serde_json::Value) -> PackageDescriptor {
        PackageDescriptor {
            name: manifest
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            version: None,
            tarball_url: None,
            manifest: manifest.as_object().unwrap().clone(),
        }
    }

    #[tokio::test]
    async fn test_no_archive_location_writes_fragment() {
        let dir = tempdir().unwrap();
        let mut descriptor = descriptor(json!({ "name": "cool-module" }));

        let result = Fetcher::new()
            .fetch(&mut descriptor, dir.path())
            .await
            .unwrap();

        // Only the manifest lands in the working directory
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![MANIFEST_FILE]);

        let written = read_manifest(dir.path()).unwrap();
        assert_eq!(written, descriptor.manifest);
        assert_eq!(result.manifest, descriptor.manifest);
    }

    #[test]
    fn test_resolve_and_merge_fills_descriptor() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            json!({
                "name": "cross-spawn",
                "version": "0.1.0",
                "description": "Cross platform child_process#spawn",
            })
            .to_string(),
        )
        .unwrap();

        let mut descriptor = descriptor(json!({ "name": "cool-module" }));

        let result = Fetcher::new()
            .resolve_and_merge(&mut descriptor, dir.path())
            .unwrap();

        // Registry name wins, archive fills the gaps
        assert_eq!(descriptor.manifest.get("name"), Some(&json!("cool-module")));
        assert_eq!(descriptor.manifest.get("version"), Some(&json!("0.1.0")));

        // On-disk manifest matches the merged view
        let written = read_manifest(dir.path()).unwrap();
        assert_eq!(written, descriptor.manifest);

        // Returned manifest is the archive's own, unmerged
        assert_eq!(result.manifest.get("name"), Some(&json!("cross-spawn")));
    }

    #[test]
    fn test_corrupt_inner_manifest_degrades_to_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{not json").unwrap();

        let mut descriptor = descriptor(json!({ "name": "cool-module" }));

        let result = Fetcher::new()
            .resolve_and_merge(&mut descriptor, dir.path())
            .unwrap();

        assert!(result.manifest.is_empty());
        assert_eq!(read_manifest(dir.path()).unwrap(), descriptor.manifest);
    }

    #[tokio::test]
    async fn test_missing_archive_upstream_yields_manifest_only() {
        let base = serve_once(
            b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_vec(),
        )
        .await;

        let dir = tempdir().unwrap();
        let mut descriptor = descriptor(json!({ "name": "cool-module" }));
        descriptor.tarball_url = Some(format!("{base}/cool-module/-/cool-module-1.0.0.tgz"));

        let result = Fetcher::new()
            .fetch(&mut descriptor, dir.path())
            .await
            .unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![MANIFEST_FILE]);
        assert_eq!(result.manifest, descriptor.manifest);
    }

    #[tokio::test]
    async fn test_declared_length_over_ceiling_fails_before_body() {
        let base = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-length: 1000000000000\r\nconnection: close\r\n\r\nfoo"
                .to_vec(),
        )
        .await;

        let dir = tempdir().unwrap();
        let mut descriptor = descriptor(json!({ "name": "cool-module" }));
        descriptor.tarball_url = Some(format!("{base}/cool-module-1.0.0.tgz"));

        let err = Fetcher::new()
            .fetch(&mut descriptor, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ArchiveTooLarge { .. }));
        assert!(err.is_unrecoverable());
    }

    #[tokio::test]
    async fn test_streamed_body_over_ceiling_aborts() {
        // No content-length declared; the ceiling must trip while streaming
        let base = serve_once(
            b"HTTP/1.1 200 OK\r\nconnection: close\r\n\r\n0123456789abcdef0123".to_vec(),
        )
        .await;

        let dir = tempdir().unwrap();
        let mut descriptor = descriptor(json!({ "name": "cool-module" }));
        descriptor.tarball_url = Some(format!("{base}/cool-module-1.0.0.tgz"));

        let err = Fetcher::with_max_archive_size(10)
            .fetch(&mut descriptor, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ArchiveTooLarge { limit: 10 }));
    }

    #[tokio::test]
    async fn test_fetch_extracts_and_merges_archive() {
        let tarball = extract::build_tarball(&[(
            "package/package.json",
            r#"{"name":"cross-spawn","version":"0.1.0","description":"Cross platform child_process#spawn"}"#,
        )]);
        let mut response = format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            tarball.len()
        )
        .into_bytes();
        response.extend_from_slice(&tarball);
        let base = serve_once(response).await;

        let dir = tempdir().unwrap();
        let mut descriptor = descriptor(json!({ "name": "cool-module" }));
        descriptor.tarball_url = Some(format!("{base}/cross-spawn-0.1.0.tgz"));

        let result = Fetcher::new()
            .fetch(&mut descriptor, dir.path())
            .await
            .unwrap();

        // Registry name wins, archive fills the gaps, on disk and in place
        assert_eq!(descriptor.manifest.get("name"), Some(&json!("cool-module")));
        assert_eq!(descriptor.manifest.get("version"), Some(&json!("0.1.0")));
        assert_eq!(read_manifest(dir.path()).unwrap(), descriptor.manifest);

        // Returned manifest is the archive's own, unmerged
        assert_eq!(result.manifest.get("name"), Some(&json!("cross-spawn")));
    }

    // Live-network test, run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_fetch_cross_spawn_tarball() {
        let dir = tempdir().unwrap();
        let mut descriptor = PackageDescriptor {
            name: "cross-spawn".to_string(),
            version: Some("0.1.0".to_string()),
            tarball_url: Some(
                "https://registry.npmjs.org/cross-spawn/-/cross-spawn-0.1.0.tgz".to_string(),
            ),
            manifest: ManifestMap::new(),
        };

        let result = Fetcher::new()
            .fetch(&mut descriptor, dir.path())
            .await
            .unwrap();

        assert!(dir.path().join(MANIFEST_FILE).exists());
        assert_eq!(
            result.manifest.get("name").and_then(serde_json::Value::as_str),
            Some("cross-spawn")
        );
    }
}
