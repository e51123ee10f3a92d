use balloon_core::base::{Digest, Hasher};

use super::Visitor;
use crate::hashing::{SET, interior_hash, leaf_hash};
use crate::Position;

/// Folds a pruned view into its root digest.
#[derive(Clone, Copy)]
pub(crate) struct ComputeHash<'a> {
    hasher: &'a dyn Hasher,
}

impl<'a> ComputeHash<'a> {
    pub(crate) const fn new(hasher: &'a dyn Hasher) -> Self {
        Self { hasher }
    }
}

impl Visitor for ComputeHash<'_> {
    type Output = Digest;

    fn visit_node(&mut self, pos: &Position, left: Digest, right: Digest) -> Digest {
        interior_hash(self.hasher, &left, &right, pos.base(), &pos.height_bytes())
    }

    fn visit_leaf(&mut self, pos: &Position, value: &[u8]) -> Digest {
        leaf_hash(self.hasher, value, SET, pos.base())
    }

    fn visit_cached(&mut self, _pos: &Position, digest: &Digest) -> Digest {
        digest.clone()
    }

    fn visit_collectable(&mut self, _pos: &Position, result: Digest) -> Digest {
        result
    }
}
