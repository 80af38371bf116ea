//! Convergence checks between two checksum trees.
//!
//! After a pass, comparing tree digests tells whether both sides hold the
//! same content without walking the diff. When they differ, the counts of
//! each diff class are reported for logging.

use crate::diff::diff;
use crate::tree::ChecksumTree;

/// Outcome of comparing a local and a remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Both trees are identical.
    Converged,
    /// The trees differ; another pass would transfer files.
    Diverged {
        changed: usize,
        remote_only: usize,
        local_only: usize,
    },
}

impl ConvergenceResult {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }
}

/// Compare two trees, using the digest as a fast path.
pub fn verify_convergence(local: &ChecksumTree, remote: &ChecksumTree) -> ConvergenceResult {
    if local.len() == remote.len() && local.digest() == remote.digest() {
        return ConvergenceResult::Converged;
    }

    let result = diff(local, remote);
    if result.is_empty() {
        return ConvergenceResult::Converged;
    }

    ConvergenceResult::Diverged {
        changed: result.changed.len(),
        remote_only: result.remote_only.len(),
        local_only: result.local_only.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fingerprint_bytes, RelPath};

    #[test]
    fn test_converged() {
        let mut t = ChecksumTree::new();
        t.insert(RelPath::new("a").unwrap(), fingerprint_bytes(b"1"));
        assert!(verify_convergence(&t, &t.clone()).is_converged());
        assert!(verify_convergence(&ChecksumTree::new(), &ChecksumTree::new()).is_converged());
    }

    #[test]
    fn test_diverged_counts() {
        let mut local = ChecksumTree::new();
        local.insert(RelPath::new("a").unwrap(), fingerprint_bytes(b"1"));
        local.insert(RelPath::new("b").unwrap(), fingerprint_bytes(b"1"));

        let mut remote = ChecksumTree::new();
        remote.insert(RelPath::new("a").unwrap(), fingerprint_bytes(b"2"));
        remote.insert(RelPath::new("c").unwrap(), fingerprint_bytes(b"1"));

        assert_eq!(
            verify_convergence(&local, &remote),
            ConvergenceResult::Diverged {
                changed: 1,
                remote_only: 1,
                local_only: 1,
            }
        );
    }
}
