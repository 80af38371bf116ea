//! Three-way classification of two checksum trees.

use std::collections::BTreeSet;

use crate::path::RelPath;
use crate::tree::ChecksumTree;

/// Paths that differ between a local and a remote tree.
///
/// The three sets are disjoint. Paths present on both sides with equal
/// fingerprints appear in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Present on both sides with different fingerprints.
    pub changed: BTreeSet<RelPath>,
    /// Present only in the remote tree.
    pub remote_only: BTreeSet<RelPath>,
    /// Present only in the local tree.
    pub local_only: BTreeSet<RelPath>,
}

impl DiffResult {
    /// True when both trees are already consistent.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.remote_only.is_empty() && self.local_only.is_empty()
    }

    /// Total number of paths needing a transfer.
    pub fn len(&self) -> usize {
        self.changed.len() + self.remote_only.len() + self.local_only.len()
    }
}

/// Classify every path of `local` and `remote`.
///
/// Fingerprint equality is the only consistency criterion. Identical
/// content under two different paths is not recognised as a move: a rename
/// shows up as one local-only and one remote-only path.
pub fn diff(local: &ChecksumTree, remote: &ChecksumTree) -> DiffResult {
    let mut result = DiffResult::default();

    for (path, remote_fp) in remote {
        match local.get(path) {
            Some(local_fp) if local_fp != remote_fp => {
                result.changed.insert(path.clone());
            }
            Some(_) => {}
            None => {
                result.remote_only.insert(path.clone());
            }
        }
    }

    for path in local.paths() {
        if !remote.contains(path) {
            result.local_only.insert(path.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fingerprint_bytes;
    use proptest::prelude::*;

    fn tree(entries: &[(&str, &str)]) -> ChecksumTree {
        entries
            .iter()
            .map(|(p, c)| (RelPath::new(p).unwrap(), fingerprint_bytes(c.as_bytes())))
            .collect()
    }

    fn paths(names: &[&str]) -> BTreeSet<RelPath> {
        names.iter().map(|n| RelPath::new(n).unwrap()).collect()
    }

    #[test]
    fn test_local_only() {
        let result = diff(&tree(&[("a.txt", "hello")]), &tree(&[]));
        assert_eq!(result.local_only, paths(&["a.txt"]));
        assert!(result.changed.is_empty());
        assert!(result.remote_only.is_empty());
    }

    #[test]
    fn test_remote_only() {
        let result = diff(&tree(&[]), &tree(&[("b.txt", "world")]));
        assert_eq!(result.remote_only, paths(&["b.txt"]));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_changed_and_consistent() {
        let local = tree(&[("same.txt", "x"), ("edit.txt", "A")]);
        let remote = tree(&[("same.txt", "x"), ("edit.txt", "B")]);
        let result = diff(&local, &remote);
        assert_eq!(result.changed, paths(&["edit.txt"]));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_rename_is_not_a_move() {
        let local = tree(&[("new-name.txt", "content")]);
        let remote = tree(&[("old-name.txt", "content")]);
        let result = diff(&local, &remote);
        assert_eq!(result.local_only, paths(&["new-name.txt"]));
        assert_eq!(result.remote_only, paths(&["old-name.txt"]));
        assert!(result.changed.is_empty());
    }

    fn arb_tree() -> impl Strategy<Value = ChecksumTree> {
        prop::collection::btree_map("[a-c]{1,2}(/[a-c]{1,2})?", 0u8..3, 0..12).prop_map(|m| {
            m.into_iter()
                .map(|(p, c)| (RelPath::new(&p).unwrap(), fingerprint_bytes(&[c])))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_diff_with_self_is_empty(t in arb_tree()) {
            prop_assert!(diff(&t, &t).is_empty());
        }

        #[test]
        fn test_sets_are_disjoint_and_sourced(local in arb_tree(), remote in arb_tree()) {
            let result = diff(&local, &remote);

            prop_assert!(result.changed.is_disjoint(&result.remote_only));
            prop_assert!(result.changed.is_disjoint(&result.local_only));
            prop_assert!(result.remote_only.is_disjoint(&result.local_only));

            for p in &result.changed {
                prop_assert!(local.contains(p) && remote.contains(p));
                prop_assert_ne!(local.get(p), remote.get(p));
            }
            for p in &result.remote_only {
                prop_assert!(remote.contains(p) && !local.contains(p));
            }
            for p in &result.local_only {
                prop_assert!(local.contains(p) && !remote.contains(p));
            }
        }

        #[test]
        fn test_unlisted_paths_are_consistent(local in arb_tree(), remote in arb_tree()) {
            let result = diff(&local, &remote);
            for (p, fp) in &local {
                let listed = result.changed.contains(p) || result.local_only.contains(p);
                prop_assert_eq!(listed, remote.get(p) != Some(fp));
            }
        }
    }
}
