//! Tarball extraction into a working directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::warn;

/// Unpacks a gzipped tarball into `target`.
///
/// Registry tarballs wrap everything in a single top-level directory
/// (conventionally `package/`); the first path component of every entry is
/// discarded so the file tree lands at the root of `target`. Entries that
/// would escape `target` are skipped.
pub fn extract_tarball(data: &[u8], target: &Path) -> io::Result<()> {
    let decoder = GzDecoder::new(data);
    let mut archive = Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;

        if entry.header().entry_type().is_dir() {
            continue;
        }

        let path = entry.path()?;
        let stripped: PathBuf = path.components().skip(1).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        if !is_safe_relative(&stripped) {
            warn!(path = %path.display(), "skipping archive entry escaping the target directory");
            continue;
        }

        let dest = target.join(&stripped);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest)?;
    }

    Ok(())
}

/// Path traversal guard: relative, no `..`, no root or prefix components.
fn is_safe_relative(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Builds a gzipped tarball in memory, for tests of the extraction and
/// download paths.
#[cfg(test)]
pub(crate) fn build_tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}
