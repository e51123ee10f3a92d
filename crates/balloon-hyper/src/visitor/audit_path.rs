use balloon_core::base::Digest;

use super::Visitor;
use crate::{AuditPath, Position};

/// Gathers the digests of collectable siblings into an [`AuditPath`].
pub(crate) struct AuditPathVisitor<V> {
    inner: V,
    path: AuditPath,
}

impl<V> AuditPathVisitor<V> {
    pub(crate) fn new(inner: V) -> Self {
        Self {
            inner,
            path: AuditPath::default(),
        }
    }

    pub(crate) fn into_path(self) -> AuditPath {
        self.path
    }
}

impl<V: Visitor<Output = Digest>> Visitor for AuditPathVisitor<V> {
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
        self.path.insert(pos.clone(), digest.clone());
        digest
    }
}
