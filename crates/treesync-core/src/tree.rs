//! Checksum trees: flat mappings from relative path to fingerprint.
//!
//! A tree is rebuilt wholesale on every pass. The backing map is ordered so
//! iteration, logging and [`ChecksumTree::digest`] are deterministic; callers
//! must not rely on ordering for anything else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hash::Fingerprint;
use crate::ignore::IgnorePolicy;
use crate::path::RelPath;

/// Domain prefix for tree digests.
const TREE_DIGEST_DOMAIN: &[u8] = b"treesync-tree-v0:";

/// Mapping from every file under a root to its content fingerprint.
///
/// Serializes as a JSON object of `{ "relative/path": "hex" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumTree {
    entries: BTreeMap<RelPath, Fingerprint>,
}

impl ChecksumTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file. Returns the previous fingerprint for `path`, if any.
    pub fn insert(&mut self, path: RelPath, fingerprint: Fingerprint) -> Option<Fingerprint> {
        self.entries.insert(path, fingerprint)
    }

    pub fn get(&self, path: &RelPath) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelPath, &Fingerprint)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RelPath> {
        self.entries.keys()
    }

    /// Drop every entry the policy ignores.
    ///
    /// Used on trees received from a remote, which may have been built
    /// with a different policy.
    pub fn without_ignored(mut self, policy: &IgnorePolicy) -> Self {
        self.entries.retain(|path, _| !policy.is_path_ignored(path));
        self
    }

    /// Deterministic digest of the whole tree.
    ///
    /// Two trees have equal digests iff they hold the same paths with the
    /// same fingerprints.
    pub fn digest(&self) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TREE_DIGEST_DOMAIN);
        hasher.update(&(self.entries.len() as u64).to_le_bytes());

        for (path, fingerprint) in &self.entries {
            hasher.update(&(path.as_str().len() as u64).to_le_bytes());
            hasher.update(path.as_str().as_bytes());
            hasher.update(fingerprint.as_bytes());
        }

        Fingerprint(*hasher.finalize().as_bytes())
    }
}

impl FromIterator<(RelPath, Fingerprint)> for ChecksumTree {
    fn from_iter<I: IntoIterator<Item = (RelPath, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChecksumTree {
    type Item = (&'a RelPath, &'a Fingerprint);
    type IntoIter = std::collections::btree_map::Iter<'a, RelPath, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fingerprint_bytes;

    fn tree(entries: &[(&str, &[u8])]) -> ChecksumTree {
        entries
            .iter()
            .map(|(p, c)| (RelPath::new(p).unwrap(), fingerprint_bytes(c)))
            .collect()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut t = ChecksumTree::new();
        let path = RelPath::new("a.txt").unwrap();
        assert!(t.insert(path.clone(), fingerprint_bytes(b"1")).is_none());
        assert_eq!(
            t.insert(path.clone(), fingerprint_bytes(b"2")),
            Some(fingerprint_bytes(b"1"))
        );
        assert_eq!(t.get(&path), Some(&fingerprint_bytes(b"2")));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = tree(&[("a.txt", b"hello"), ("b/c.txt", b"world")]);
        let b = tree(&[("b/c.txt", b"world"), ("a.txt", b"hello")]);
        assert_eq!(a.digest(), b.digest());

        let c = tree(&[("a.txt", b"hello"), ("b/c.txt", b"world!")]);
        assert_ne!(a.digest(), c.digest());

        let renamed = tree(&[("a2.txt", b"hello"), ("b/c.txt", b"world")]);
        assert_ne!(a.digest(), renamed.digest());
    }

    #[test]
    fn test_without_ignored() {
        let t = tree(&[("a.txt", b"1"), (".DS_Store", b"x"), ("d/Thumbs.db", b"y")]);
        let filtered = t.without_ignored(&IgnorePolicy::default());
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains(&RelPath::new("a.txt").unwrap()));
    }

    #[test]
    fn test_json_shape() {
        let t = tree(&[("dir/a.txt", b"hello")]);
        let json = serde_json::to_value(&t).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(
            obj["dir/a.txt"].as_str().unwrap(),
            fingerprint_bytes(b"hello").to_hex()
        );

        let back: ChecksumTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_json_rejects_escaping_path() {
        let json = format!("{{\"../evil\": \"{}\"}}", fingerprint_bytes(b"x").to_hex());
        let parsed: std::result::Result<ChecksumTree, _> = serde_json::from_str(&json);
        assert!(parsed.is_err());
    }
}
