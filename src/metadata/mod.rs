//! Metadata normalizer.
//!
//! Reconciles the raw registry document and the resolved manifest into one
//! canonical [`PackageMetadata`] record. Total by design: every malformed
//! input shape degrades to the nearest valid default instead of failing.

pub mod spdx;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::types::{ManifestMap, PackageMetadata, Person, Release, Releases};

/// Placeholder the registry stores when a package has no README.
const NO_README_PLACEHOLDER: &str = "No README data";

/// Placeholder npm writes into `scripts.test` when none was specified.
const NO_TEST_PLACEHOLDER: &str = "no test specified";

/// Collects canonical metadata from the registry document and the manifest.
///
/// `now` is only used as the publish-date fallback for versions the registry
/// `time` map does not cover; passing it in keeps collection deterministic
/// under test.
pub fn collect(data: &ManifestMap, manifest: &ManifestMap, now: DateTime<Utc>) -> PackageMetadata {
    PackageMetadata {
        name: str_field(manifest, "name").unwrap_or_default(),
        version: str_field(manifest, "version"),
        description: str_field(manifest, "description"),
        keywords: extract_keywords(manifest),
        license: extract_license(manifest),
        publisher: extract_publisher(data, manifest),
        maintainers: extract_maintainers(data, manifest),
        releases: extract_releases(data, now),
        deprecated: str_field(manifest, "deprecated"),
        has_test_script: has_test_script(manifest),
        bundled_dependencies: extract_bundled_dependencies(manifest),
        readme: extract_readme(data),
    }
}

fn str_field(map: &ManifestMap, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

fn extract_keywords(manifest: &ManifestMap) -> Option<Vec<String>> {
    let keywords = match manifest.get("keywords")? {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        // Some legacy manifests carry a comma separated string
        Value::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect::<Vec<_>>(),
        _ => return None,
    };

    (!keywords.is_empty()).then_some(keywords)
}

/// Accepts the license as a string, an array of strings, a `{type}` object,
/// or an array of such objects, reducing arrays to an SPDX OR expression.
fn extract_license(manifest: &ManifestMap) -> Option<String> {
    fn license_id(value: &Value) -> Option<&str> {
        value
            .as_str()
            .or_else(|| value.get("type").and_then(Value::as_str))
    }

    let expression = match manifest.get("license")? {
        Value::Array(items) => {
            let ids: Vec<&str> = items.iter().filter_map(license_id).collect();
            if ids.is_empty() {
                return None;
            }
            ids.join(" OR ")
        }
        other => license_id(other)?.to_string(),
    };

    Some(spdx::normalize(&expression))
}

fn person_from(value: &Value) -> Option<Person> {
    let obj = value.as_object()?;
    Some(Person {
        username: obj.get("name").and_then(Value::as_str)?.to_string(),
        email: obj.get("email").and_then(Value::as_str).map(String::from),
    })
}

/// Publisher precedence: the recorded submitter identity, then the manifest
/// author matched by email against the registry maintainers, then against
/// the manifest's own maintainers.
fn extract_publisher(data: &ManifestMap, manifest: &ManifestMap) -> Option<Person> {
    if let Some(user) = manifest.get("_npmUser").and_then(person_from) {
        return Some(user);
    }

    let author_email = manifest
        .get("author")
        .and_then(|author| author.get("email"))
        .and_then(Value::as_str)?;

    for source in [data, manifest] {
        let Some(maintainers) = source.get("maintainers").and_then(Value::as_array) else {
            continue;
        };

        let matched = maintainers
            .iter()
            .find(|m| m.get("email").and_then(Value::as_str) == Some(author_email));

        if let Some(username) = matched.and_then(|m| m.get("name")).and_then(Value::as_str) {
            return Some(Person {
                username: username.to_string(),
                email: Some(author_email.to_string()),
            });
        }
    }

    None
}

fn extract_maintainers(data: &ManifestMap, manifest: &ManifestMap) -> Option<Vec<Person>> {
    let list = data
        .get("maintainers")
        .and_then(Value::as_array)
        .or_else(|| manifest.get("maintainers").and_then(Value::as_array))?;

    let people: Vec<Person> = list.iter().filter_map(person_from).collect();
    (!people.is_empty()).then_some(people)
}

/// Derives first and latest releases from the version history.
///
/// Ordering follows the publish dates in the `time` map when present, else
/// a lenient version ordering. Without any history both releases synthesize
/// to `0.0.1` with no date.
fn extract_releases(data: &ManifestMap, now: DateTime<Utc>) -> Releases {
    let time = data.get("time").and_then(Value::as_object);

    let mut entries: Vec<Release> = Vec::new();

    if let Some(versions) = data.get("versions").and_then(Value::as_object) {
        for version in versions.keys() {
            let date = time.map(|t| publish_date(t, version, now));
            entries.push(Release {
                version: version.clone(),
                date,
            });
        }
    } else if let Some(time) = time {
        // Unpublished versions only survive in the time map
        for version in time.keys() {
            if version == "created" || version == "modified" {
                continue;
            }
            entries.push(Release {
                version: version.clone(),
                date: Some(publish_date(time, version, now)),
            });
        }
    }

    if entries.iter().all(|release| release.date.is_some()) {
        entries.sort_by_key(|release| release.date);
    } else {
        entries.sort_by(|a, b| compare_versions(&a.version, &b.version));
    }

    let (Some(first), Some(latest)) = (entries.first().cloned(), entries.last().cloned()) else {
        // No version history at all
        let release = Release {
            version: "0.0.1".to_string(),
            date: None,
        };
        return Releases {
            first: release.clone(),
            latest: release,
        };
    };

    Releases { first, latest }
}

fn publish_date(time: &Map<String, Value>, version: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    time.get(version)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(now)
}

/// Lenient dotted-numeric ordering; good enough for registries that mostly
/// publish semver-ish versions. A prerelease orders below its bare version.
fn compare_versions(a: &str, b: &str) -> Ordering {
    fn split(version: &str) -> (Vec<u64>, Option<&str>) {
        let version = version.trim_start_matches('v');
        // Build metadata never affects ordering
        let version = version.split_once('+').map_or(version, |(v, _)| v);

        let (release, prerelease) = match version.split_once('-') {
            Some((release, prerelease)) => (release, Some(prerelease)),
            None => (version, None),
        };

        let parts = release
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect();

        (parts, prerelease)
    }

    let (a_parts, a_pre) = split(a);
    let (b_parts, b_pre) = split(b);

    a_parts.cmp(&b_parts).then_with(|| match (a_pre, b_pre) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a_pre), Some(b_pre)) => a_pre.cmp(b_pre),
    })
}

fn has_test_script(manifest: &ManifestMap) -> bool {
    manifest
        .get("scripts")
        .and_then(|scripts| scripts.get("test"))
        .and_then(Value::as_str)
        .is_some_and(|test| !test.trim().is_empty() && !test.contains(NO_TEST_PLACEHOLDER))
}

fn extract_bundled_dependencies(manifest: &ManifestMap) -> Option<Map<String, Value>> {
    manifest
        .get("bundledDependencies")
        // Legacy spelling used by old manifests
        .or_else(|| manifest.get("bundleDependencies"))
        .and_then(Value::as_object)
        .filter(|deps| !deps.is_empty())
        .cloned()
}

fn extract_readme(data: &ManifestMap) -> Option<String> {
    // Old documents sometimes carry a non-string README, e.g. `flatsite`
    let readme = data.get("readme")?.as_str()?;

    if readme.is_empty() || readme == NO_README_PLACEHOLDER {
        return None;
    }

    Some(readme.to_string())
}
