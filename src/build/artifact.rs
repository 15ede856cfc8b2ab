// src/build/artifact.rs

//! Locating the freshly built plugin file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::errors::{PlugwatchError, Result};
use crate::fs::FileSystem;

/// Find the artifact in `dir` whose file name starts with `prefix` and ends
/// with `.{extension}`. Only direct children of `dir` are considered.
///
/// Build output directories tend to keep stale jars around (old versions,
/// `-plain` variants), so when several files match the most recently
/// modified one is returned, ties broken by file name.
pub fn find_artifact(
    fs: &dyn FileSystem,
    dir: &Path,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf> {
    let not_found = || PlugwatchError::ArtifactNotFoundError {
        dir: dir.to_path_buf(),
        prefix: prefix.to_string(),
    };

    if !fs.is_dir(dir) {
        return Err(not_found());
    }

    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut candidates: Vec<(SystemTime, String, PathBuf)> = Vec::new();

    for path in fs.read_dir(dir)? {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !name.starts_with(prefix) || !name.ends_with(&suffix) || !fs.is_file(&path) {
            continue;
        }
        match fs.metadata(&path) {
            Ok(meta) => candidates.push((meta.modified, name, path)),
            Err(err) => warn!(path = ?path, error = %err, "skipping unreadable artifact candidate"),
        }
    }

    if candidates.len() > 1 {
        let names: Vec<&str> = candidates.iter().map(|(_, n, _)| n.as_str()).collect();
        warn!(
            dir = ?dir,
            candidates = ?names,
            "several artifacts match; using the most recently modified"
        );
    }

    candidates
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, _, path)| path)
        .ok_or_else(not_found)
}
