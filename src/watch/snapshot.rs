// src/watch/snapshot.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Last observed state of one regular file.
///
/// Two records are equal iff path, modification time and size all match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime, size: u64) -> Self {
        Self {
            path: path.into(),
            modified,
            size,
        }
    }

    /// True if `other` describes the same path with different content stamps.
    pub fn differs_from(&self, other: &FileRecord) -> bool {
        self.modified != other.modified || self.size != other.size
    }
}

/// All regular files under the watched roots at one scan instant.
///
/// A snapshot is never mutated after a scan produces it; the watcher replaces
/// its reference snapshot wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<PathBuf, FileRecord>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }
}

impl FromIterator<FileRecord> for Snapshot {
    fn from_iter<T: IntoIterator<Item = FileRecord>>(iter: T) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|record| (record.path.clone(), record))
                .collect(),
        }
    }
}
