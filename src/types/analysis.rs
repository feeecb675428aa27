//! Canonical analysis records produced by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A person referenced by package metadata (publisher or maintainer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One published release of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// First and latest releases of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Releases {
    pub first: Release,
    pub latest: Release,
}

/// Canonical package metadata, reconciled from the raw registry document and
/// the resolved manifest.
///
/// Pure data: owns no resources and is never mutated after collection.
/// Serialized camelCase to match the analysis document stored downstream;
/// absent fields are omitted rather than null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Single SPDX expression, best-effort corrected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainers: Option<Vec<Person>>,
    pub releases: Releases,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    pub has_test_script: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundled_dependencies: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
}

/// Output of the collection stage for one package.
///
/// Sibling collectors (downloads, source inspection, repository activity)
/// would slot in beside `metadata`; this pipeline only carries the metadata
/// collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collected {
    pub metadata: PackageMetadata,
}

/// The analysis document stored for one package and handed to the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub analyzed_at: DateTime<Utc>,
    pub collected: Collected,
}

/// Score payload produced by the external scorer and written to the search
/// index. The pipeline treats the detail breakdown as opaque data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "final")]
    pub final_score: f64,
    #[serde(default)]
    pub detail: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_omits_absent_fields() {
        let metadata = PackageMetadata {
            name: "cross-spawn".to_string(),
            version: None,
            description: None,
            keywords: None,
            license: None,
            publisher: None,
            maintainers: None,
            releases: Releases {
                first: Release { version: "0.0.1".to_string(), date: None },
                latest: Release { version: "0.0.1".to_string(), date: None },
            },
            deprecated: None,
            has_test_script: false,
            bundled_dependencies: None,
            readme: None,
        };

        let value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "cross-spawn",
                "releases": {
                    "first": { "version": "0.0.1" },
                    "latest": { "version": "0.0.1" },
                },
                "hasTestScript": false,
            })
        );
    }

    #[test]
    fn test_score_record_roundtrip() {
        let raw = json!({
            "final": 0.83,
            "detail": { "quality": 0.9, "popularity": 0.7, "maintenance": 0.9 },
        });

        let score: ScoreRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(score.final_score, 0.83);
        assert_eq!(score.detail.get("quality"), Some(&json!(0.9)));
    }
}
