//! Manifest merge with registry precedence.

use crate::types::ManifestMap;

/// Copies fields present in `from` but absent from `base` into `base`,
/// returning the names of the fields copied.
///
/// Fields already on `base` are never overwritten, so registry-supplied
/// values always win over archive-supplied ones.
pub fn fill_missing(base: &mut ManifestMap, from: &ManifestMap) -> Vec<String> {
    let mut copied = Vec::new();

    for (key, value) in from {
        if !base.contains_key(key) {
            base.insert(key.clone(), value.clone());
            copied.push(key.clone());
        }
    }

    copied
}
