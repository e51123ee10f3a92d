use std::collections::BTreeMap;

use balloon_core::base::{Digest, HasherKind};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tracing::debug;

use crate::pruning::{PruningContext, SingleTargetedCacheResolver, VerifyPruner};
use crate::visitor::ComputeHash;
use crate::{Cache, DefaultHashes, Position, cache_level};

/// Sibling digests along the path from a leaf to the root, ordered by position.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditPath(#[serde_as(as = "Vec<(_, _)>")] BTreeMap<Position, Digest>);

impl AuditPath {
    /// Record the digest of a sibling.
    pub fn insert(&mut self, pos: Position, digest: Digest) {
        self.0.insert(pos, digest);
    }

    /// Number of recorded siblings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no sibling is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Siblings in position order.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, &Digest)> {
        self.0.iter()
    }

    /// Mutable access to a recorded digest.
    pub fn get_mut(&mut self, pos: &Position) -> Option<&mut Digest> {
        self.0.get_mut(pos)
    }
}

impl Cache for AuditPath {
    fn get(&self, pos: &Position) -> Option<Digest> {
        self.0.get(pos).cloned()
    }
}

/// Membership proof of one event digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProof {
    /// The proven event digest.
    pub key: Digest,
    /// Version the event was inserted at.
    pub value: u64,
    /// Siblings of the path from the leaf to the root.
    pub audit_path: AuditPath,
    /// Hasher the tree was built with.
    pub hasher: HasherKind,
}

impl QueryProof {
    /// Check the proof against a root without any tree or store.
    ///
    /// The hasher is rebuilt from [`QueryProof::hasher`] together with a fresh default
    /// ladder. Returns `false` for any mismatch, including digests of the wrong width.
    #[must_use]
    pub fn verify(&self, version: u64, event_digest: &Digest, expected_root: &Digest) -> bool {
        let hasher = self.hasher.build();
        let n = hasher.bit_len();
        let width = usize::from(n / 8);
        if event_digest.len() != width || expected_root.len() != width {
            debug!(
                expected = width,
                event = event_digest.len(),
                root = expected_root.len(),
                "Digest width mismatch"
            );
            return false;
        }
        let ladder = DefaultHashes::new(hasher.as_ref());
        let version = version.to_be_bytes();
        let ctx = PruningContext {
            n,
            resolver: SingleTargetedCacheResolver::new(event_digest.as_bytes(), cache_level(n)),
            cache: &self.audit_path,
            store: None,
            ladder: &ladder,
        };
        match VerifyPruner::new(&version, ctx).prune() {
            Ok(pruned) => &pruned.post_order(&mut ComputeHash::new(hasher.as_ref())) == expected_root,
            Err(e) => {
                debug!(error = %e, "Proof does not fit the tree");
                false
            }
        }
    }
}
