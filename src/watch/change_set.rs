// src/watch/change_set.rs

//! Change detection: diffing two snapshots into a [`ChangeSet`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::watch::path_utils::display_slash;
use crate::watch::snapshot::Snapshot;

/// Paths that changed between two snapshots.
///
/// The three sets are pairwise disjoint. An empty change set means nothing
/// changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub created: BTreeSet<PathBuf>,
    pub modified: BTreeSet<PathBuf>,
    pub deleted: BTreeSet<PathBuf>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.created.len() + self.modified.len() + self.deleted.len()
    }

    /// Every changed path, in created / modified / deleted order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.created
            .iter()
            .chain(self.modified.iter())
            .chain(self.deleted.iter())
    }

    /// Fold a later change set into this one, keeping the three sets
    /// disjoint. The result describes the net effect of both.
    pub fn absorb(&mut self, later: ChangeSet) {
        for path in later.created {
            if self.deleted.remove(&path) {
                self.modified.insert(path);
            } else {
                self.created.insert(path);
            }
        }
        for path in later.modified {
            if !self.created.contains(&path) {
                self.modified.insert(path);
            }
        }
        for path in later.deleted {
            if self.created.remove(&path) {
                continue;
            }
            self.modified.remove(&path);
            self.deleted.insert(path);
        }
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let groups = [
            ('+', &self.created),
            ('~', &self.modified),
            ('-', &self.deleted),
        ];
        for (sigil, paths) in groups {
            for path in paths {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{sigil}{}", display_slash(path))?;
            }
        }
        if first {
            f.write_str("(no changes)")?;
        }
        Ok(())
    }
}

/// Compare `old` against `new`.
///
/// - in `new` only: created
/// - in both with a different (mtime, size): modified
/// - in `old` only: deleted
///
/// Unchanged entries are omitted. No hidden state: the result depends only on
/// the two arguments.
pub fn diff(old: &Snapshot, new: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for record in new.records() {
        match old.get(&record.path) {
            None => {
                changes.created.insert(record.path.clone());
            }
            Some(previous) if previous.differs_from(record) => {
                changes.modified.insert(record.path.clone());
            }
            Some(_) => {}
        }
    }

    for path in old.paths() {
        if !new.contains(path) {
            changes.deleted.insert(path.clone());
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::snapshot::FileRecord;
    use std::time::{Duration, UNIX_EPOCH};

    fn rec(path: &str, t: u64, size: u64) -> FileRecord {
        FileRecord::new(path, UNIX_EPOCH + Duration::from_secs(t), size)
    }

    #[test]
    fn classifies_created_modified_deleted() {
        let old: Snapshot = [rec("a", 1, 10), rec("b", 1, 10), rec("c", 1, 10)]
            .into_iter()
            .collect();
        let new: Snapshot = [rec("a", 1, 10), rec("b", 2, 10), rec("d", 1, 1)]
            .into_iter()
            .collect();

        let changes = diff(&old, &new);

        assert_eq!(changes.created, BTreeSet::from([PathBuf::from("d")]));
        assert_eq!(changes.modified, BTreeSet::from([PathBuf::from("b")]));
        assert_eq!(changes.deleted, BTreeSet::from([PathBuf::from("c")]));
        assert_eq!(changes.to_string(), "+d, ~b, -c");
    }

    #[test]
    fn size_only_change_counts_as_modified() {
        let old: Snapshot = [rec("A.java", 5, 100)].into_iter().collect();
        let new: Snapshot = [rec("A.java", 5, 120)].into_iter().collect();
        assert_eq!(diff(&old, &new).modified.len(), 1);
    }

    #[test]
    fn empty_change_set_displays_placeholder() {
        assert_eq!(ChangeSet::default().to_string(), "(no changes)");
    }

    #[test]
    fn absorb_nets_out_create_then_delete() {
        let mut first = ChangeSet::default();
        first.created.insert(PathBuf::from("tmp"));
        first.deleted.insert(PathBuf::from("old"));

        let mut later = ChangeSet::default();
        later.deleted.insert(PathBuf::from("tmp"));
        later.created.insert(PathBuf::from("old"));
        later.modified.insert(PathBuf::from("x"));

        first.absorb(later);

        assert!(first.created.is_empty());
        assert_eq!(first.modified, BTreeSet::from([PathBuf::from("old"), PathBuf::from("x")]));
        assert!(first.deleted.is_empty());
    }
}
