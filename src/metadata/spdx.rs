//! Best-effort SPDX license normalization.
//!
//! Valid expressions pass through untouched; common shorthands are corrected
//! through an alias table. The table is deliberately small and meant to be
//! extended as new shorthands show up in the wild.

/// Identifiers accepted as-is inside expressions.
const KNOWN_IDS: &[&str] = &[
    "0BSD",
    "AGPL-3.0",
    "Apache-1.1",
    "Apache-2.0",
    "Artistic-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSD-4-Clause",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC0-1.0",
    "EPL-1.0",
    "EPL-2.0",
    "GPL-2.0",
    "GPL-3.0",
    "ISC",
    "LGPL-2.1",
    "LGPL-3.0",
    "MIT",
    "MPL-1.1",
    "MPL-2.0",
    "Unlicense",
    "WTFPL",
    "Zlib",
];

/// Shorthand → canonical identifier. Lookup keys are uppercased.
const ALIASES: &[(&str, &str)] = &[
    ("AGPL", "AGPL-3.0"),
    ("AGPLV3", "AGPL-3.0"),
    ("APACHE", "Apache-2.0"),
    ("APACHE 2.0", "Apache-2.0"),
    ("APACHE-2", "Apache-2.0"),
    ("APACHE2", "Apache-2.0"),
    ("BSD", "BSD-2-Clause"),
    ("BSD-2", "BSD-2-Clause"),
    ("BSD-3", "BSD-3-Clause"),
    ("BSD3", "BSD-3-Clause"),
    ("NEW BSD", "BSD-3-Clause"),
    ("CC0", "CC0-1.0"),
    ("GPL", "GPL-3.0"),
    ("GPL-2", "GPL-2.0"),
    ("GPL2", "GPL-2.0"),
    ("GPLV2", "GPL-2.0"),
    ("GPL-3", "GPL-3.0"),
    ("GPL3", "GPL-3.0"),
    ("GPLV3", "GPL-3.0"),
    ("LGPL", "LGPL-3.0"),
    ("LGPLV2", "LGPL-2.1"),
    ("LGPLV3", "LGPL-3.0"),
    ("MIT/X11", "MIT"),
    ("MOZILLA PUBLIC LICENSE", "MPL-2.0"),
    ("MPL", "MPL-2.0"),
    ("MPL2", "MPL-2.0"),
    ("PUBLIC DOMAIN", "Unlicense"),
    ("X11", "MIT"),
];

/// Normalizes a raw license string to an SPDX expression.
///
/// Valid expressions are preserved verbatim; otherwise the alias table is
/// consulted, and if no correction exists the original string is kept.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    if is_valid_expression(trimmed) {
        return trimmed.to_string();
    }

    correct(trimmed).unwrap_or_else(|| trimmed.to_string())
}

/// True when every non-operator token of `expr` is a known identifier.
pub fn is_valid_expression(expr: &str) -> bool {
    let mut saw_identifier = false;

    for token in expr.replace(['(', ')'], " ").split_whitespace() {
        if matches!(token, "OR" | "AND" | "WITH") {
            continue;
        }

        let id = token.strip_suffix('+').unwrap_or(token);
        if !KNOWN_IDS.contains(&id) {
            return false;
        }
        saw_identifier = true;
    }

    saw_identifier
}

/// Nearest known identifier for a shorthand, if the table has one.
pub fn correct(raw: &str) -> Option<String> {
    let key = raw.to_uppercase();

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, id)| (*id).to_string())
        .or_else(|| {
            // Case-slips like "mit" map back to the canonical spelling
            KNOWN_IDS
                .iter()
                .find(|id| id.eq_ignore_ascii_case(raw))
                .map(|id| (*id).to_string())
        })
}
