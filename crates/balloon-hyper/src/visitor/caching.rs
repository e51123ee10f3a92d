use balloon_core::base::Digest;

use super::Visitor;
use crate::Position;

/// Records the digest of every collectable node while delegating the fold.
pub(crate) struct Caching<V> {
    inner: V,
    cached: Vec<(Position, Digest)>,
}

impl<V> Caching<V> {
    pub(crate) const fn new(inner: V) -> Self {
        Self {
            inner,
            cached: Vec::new(),
        }
    }

    /// Collected entries, children before parents.
    pub(crate) fn into_cached(self) -> Vec<(Position, Digest)> {
        self.cached
    }
}

impl<V: Visitor<Output = Digest>> Visitor for Caching<V> {
    type Output = Digest;

    fn visit_node(&mut self, pos: &Position, left: Digest, right: Digest) -> Digest {
        self.inner.visit_node(pos, left, right)
    }

    fn visit_leaf(&mut self, pos: &Position, value: &[u8]) -> Digest {
        self.inner.visit_leaf(pos, value)
    }

    fn visit_cached(&mut self, pos: &Position, digest: &Digest) -> Digest {
        self.inner.visit_cached(pos, digest)
    }

    fn visit_collectable(&mut self, pos: &Position, result: Digest) -> Digest {
        let digest = self.inner.visit_collectable(pos, result);
        self.cached.push((pos.clone(), digest.clone()));
        digest
    }
}
