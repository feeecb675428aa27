//! Registry-side package descriptor types.

use serde_json::{Map, Value};

/// The manifest is semi-structured upstream data, so it is carried as a raw
/// JSON object and read through best-effort accessors.
pub type ManifestMap = Map<String, Value>;

/// The registry's view of one package version.
///
/// Built from the package document's latest dist-tag. The archive fetcher
/// fills manifest fields the registry was missing in place; fields the
/// registry already reported are never overwritten.
#[derive(Debug, Clone, Default)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: Option<String>,
    /// URL of the distributable tarball, when the registry knows one.
    pub tarball_url: Option<String>,
    /// Manifest fields the registry already knows for this version.
    pub manifest: ManifestMap,
}

impl PackageDescriptor {
    /// Derives the descriptor for the latest published version from a raw
    /// registry package document.
    pub fn from_document(name: &str, doc: &ManifestMap) -> Self {
        let latest = doc
            .get("dist-tags")
            .and_then(|tags| tags.get("latest"))
            .and_then(Value::as_str);

        let mut manifest = latest
            .and_then(|version| doc.get("versions")?.get(version))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        // Old documents sometimes lack the name inside the version manifest
        if !manifest.contains_key("name") {
            manifest.insert("name".to_string(), Value::String(name.to_string()));
        }

        let version = manifest
            .get("version")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| latest.map(String::from));

        let tarball_url = manifest
            .get("dist")
            .and_then(|dist| dist.get("tarball"))
            .and_then(Value::as_str)
            .map(String::from);

        Self {
            name: name.to_string(),
            version,
            tarball_url,
            manifest,
        }
    }
}
