// src/watch/scanner.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, trace, warn};

use crate::errors::PlugwatchError;
use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;
use crate::watch::snapshot::{FileRecord, Snapshot};

/// Walks a fixed set of root directories and produces [`Snapshot`]s.
///
/// - Roots that don't exist (yet) are skipped silently.
/// - Entries that can't be read are logged as `ScanError`s and left out of the
///   snapshot; the rest of the scan carries on.
/// - Symlink cycles are not defended against.
#[derive(Clone)]
pub struct DirectoryScanner {
    fs: Arc<dyn FileSystem>,
    roots: Vec<PathBuf>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl DirectoryScanner {
    pub fn new(fs: Arc<dyn FileSystem>, roots: Vec<PathBuf>) -> Self {
        Self {
            fs,
            roots,
            exclude: None,
        }
    }

    /// Ignore files whose root-relative path matches any of `patterns`.
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude = compile_globset(patterns)?;
        Ok(self)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk every existing root and collect a fresh snapshot.
    pub fn scan(&self) -> Snapshot {
        let mut records = Vec::new();

        for root in self.roots.iter() {
            if !self.fs.is_dir(root) {
                trace!(root = ?root, "watch root missing; skipping");
                continue;
            }
            self.walk_root(root, &mut records);
        }

        let snapshot: Snapshot = records.into_iter().collect();
        debug!(files = snapshot.len(), "scan complete");
        snapshot
    }

    fn walk_root(&self, root: &Path, records: &mut Vec<FileRecord>) {
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    report_scan_error(&dir, &err);
                    continue;
                }
            };

            for path in entries {
                if self.fs.is_dir(&path) {
                    stack.push(path);
                } else if self.fs.is_file(&path) {
                    if self.is_excluded(root, &path) {
                        continue;
                    }
                    match self.fs.metadata(&path) {
                        Ok(meta) => records.push(FileRecord::new(path, meta.modified, meta.len)),
                        Err(err) => report_scan_error(&path, &err),
                    }
                }
            }
        }
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let Some(exclude) = &self.exclude else {
            return false;
        };
        relative_str(root, path)
            .map(|rel| exclude.is_match(rel.as_str()))
            .unwrap_or(false)
    }
}

fn report_scan_error(path: &Path, err: &anyhow::Error) {
    let err = PlugwatchError::ScanError {
        path: path.to_path_buf(),
        message: format!("{err:#}"),
    };
    warn!(error = %err, "skipping unreadable entry");
}

fn compile_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("invalid exclude pattern '{pattern}'"))?;
        builder.add(glob);
    }
    Ok(Some(builder.build().context("building exclude glob set")?))
}
