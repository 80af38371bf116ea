//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use treesync_core::{fingerprint_bytes, ChecksumTree, Fingerprint, RelPath};

/// Generate a path segment that no default ignore rule matches.
pub fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}".prop_map(String::from)
}

/// Generate a relative path of one to three segments.
pub fn rel_path() -> impl Strategy<Value = RelPath> {
    prop::collection::vec(segment(), 1..=3).prop_map(|segments| {
        RelPath::from_segments(segments.iter().map(String::as_str))
            .unwrap_or_else(|e| panic!("generated invalid path {segments:?}: {e}"))
    })
}

/// Generate a random fingerprint.
pub fn fingerprint() -> impl Strategy<Value = Fingerprint> {
    any::<[u8; 32]>().prop_map(Fingerprint::from_bytes)
}

/// Generate file contents of specified max length.
pub fn contents(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a set of files that can coexist on disk.
///
/// No path is a directory prefix of another, so `a` and `a/b` never
/// appear together.
pub fn file_set() -> impl Strategy<Value = BTreeMap<RelPath, Vec<u8>>> {
    prop::collection::btree_map(rel_path(), contents(64), 0..12).prop_map(prefix_free)
}

/// Generate a checksum tree over a realizable file set.
pub fn checksum_tree() -> impl Strategy<Value = ChecksumTree> {
    file_set().prop_map(|files| {
        files
            .iter()
            .map(|(path, data)| (path.clone(), fingerprint_bytes(data)))
            .collect()
    })
}

fn prefix_free(mut files: BTreeMap<RelPath, Vec<u8>>) -> BTreeMap<RelPath, Vec<u8>> {
    let dirs: Vec<String> = files.keys().map(|p| format!("{}/", p.as_str())).collect();
    files.retain(|path, _| !dirs.iter().any(|dir| path.as_str().starts_with(dir.as_str())));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use treesync_core::{diff, IgnorePolicy};

    proptest! {
        #[test]
        fn test_generated_paths_are_not_ignored(path in rel_path()) {
            prop_assert!(!IgnorePolicy::default().is_path_ignored(&path));
        }

        #[test]
        fn test_generated_paths_survive_host_conversion(path in rel_path()) {
            let host = path.to_host_path(Path::new("/root"));
            let back = RelPath::from_host_path(host.strip_prefix("/root").unwrap()).unwrap();
            prop_assert_eq!(back, path);
        }

        #[test]
        fn test_file_sets_are_prefix_free(files in file_set()) {
            for a in files.keys() {
                for b in files.keys() {
                    let dir = format!("{}/", a.as_str());
                    prop_assert!(!b.as_str().starts_with(&dir));
                }
            }
        }

        #[test]
        fn test_generated_trees_diff_empty_with_self(tree in checksum_tree()) {
            prop_assert!(diff(&tree, &tree).is_empty());
        }
    }
}
