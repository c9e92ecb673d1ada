// On-disk thumbnail cache: path layout, mtime staleness, partition sweeps.
//
// The tree is partitioned first by scale factor ("X1", "X1.5", ...) and then
// by kind and format version ("cursor-v1"). Staleness is structural: a
// partition that no longer matches the active scale or version is deleted
// wholesale, so no per-entry eviction policy exists.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Error;

pub fn scale_dir_name(scale: f64) -> String {
    format!("X{scale}")
}

pub fn version_dir_name(kind: &str, version: u32) -> String {
    format!("{kind}-v{version}")
}

/// Build `<root>/X<scale>/<kind>-v<version>/<id>.png`, creating the
/// intermediate directories.
pub fn output_path(
    root: &Path,
    kind: &str,
    id: &str,
    version: u32,
    scale: f64,
) -> Result<PathBuf, Error> {
    let dir = root
        .join(scale_dir_name(scale))
        .join(version_dir_name(kind, version));
    fs::create_dir_all(&dir).map_err(|source| Error::CacheDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir.join(format!("{id}.png")))
}

/// Whether `cached` must be regenerated from `source`.
///
/// A source that names a file is tracked through its parent directory, so a
/// cursor theme's description file invalidates on any change inside the
/// theme directory. Pure mtime comparison, no content hashing.
pub fn is_stale(source: &Path, cached: &Path) -> bool {
    let Ok(cached_mtime) = fs::metadata(cached).and_then(|meta| meta.modified()) else {
        return true;
    };

    let source_dir = if source.is_file() {
        source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.to_path_buf())
    } else {
        source.to_path_buf()
    };

    match fs::metadata(&source_dir).and_then(|meta| meta.modified()) {
        Ok(source_mtime) => source_mtime > cached_mtime,
        Err(_) => false,
    }
}

/// Delete every `X*` scale partition under `root` except `keep`.
pub fn sweep_scale_dirs(root: &Path, keep: &str) {
    remove_unmatched(root, "X", keep);
}

/// Delete every `<kind>-v*` version partition under `scale_dir` except the
/// one for `version`.
pub fn sweep_version_dirs(scale_dir: &Path, kind: &str, version: u32) {
    let prefix = format!("{kind}-v");
    remove_unmatched(scale_dir, &prefix, &version_dir_name(kind, version));
}

fn remove_unmatched(parent: &Path, prefix: &str, keep: &str) {
    if !parent.is_dir() {
        return;
    }
    for entry in WalkDir::new(parent).min_depth(1).max_depth(1) {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.starts_with(prefix) || name == keep {
            continue;
        }
        if let Err(err) = fs::remove_dir_all(entry.path()) {
            tracing::warn!(
                "failed to remove stale cache dir {}: {err}",
                entry.path().display()
            );
        }
    }
}
