use balloon_core::storage::KvPair;

use super::{Pruned, PruningContext};
use crate::{HyperError, Position};

/// Prunes the tree for inserting `(key, value)`.
///
/// On-path nodes at or above the cache level come back wrapped in
/// [`Pruned::Collectable`] so their new digests can be cached and persisted.
pub(crate) struct InsertPruner<'a> {
    key: &'a [u8],
    value: &'a [u8],
    ctx: PruningContext<'a>,
}

impl<'a> InsertPruner<'a> {
    pub(crate) const fn new(key: &'a [u8], value: &'a [u8], ctx: PruningContext<'a>) -> Self {
        Self { key, value, ctx }
    }

    pub(crate) fn prune(&self) -> Result<Pruned, HyperError> {
        self.traverse(self.ctx.root())
    }

    fn traverse(&self, pos: Position) -> Result<Pruned, HyperError> {
        let resolver = &self.ctx.resolver;
        if resolver.should_get_from_cache(&pos) {
            return self.ctx.cached_or_default(pos);
        }
        if resolver.should_load_leaves(&pos) {
            let mut leaves = self.ctx.load_leaves(&pos)?;
            insert_sorted(&mut leaves, KvPair::new(self.key, self.value));
            return Ok(self.ctx.from_leaves(pos, &leaves)?.collectable());
        }
        let left = self.traverse(pos.left()?)?;
        let right = self.traverse(pos.right()?)?;
        let cache = resolver.should_cache(&pos);
        let node = Pruned::node(pos, left, right);
        Ok(if cache { node.collectable() } else { node })
    }
}

/// Insert `leaf` keeping `leaves` sorted; an existing key takes the new value.
fn insert_sorted(leaves: &mut Vec<KvPair>, leaf: KvPair) {
    match leaves.binary_search_by(|probe| probe.key.cmp(&leaf.key)) {
        Ok(found) => {
            if let Some(slot) = leaves.get_mut(found) {
                *slot = leaf;
            }
        }
        Err(at) => leaves.insert(at, leaf),
    }
}

#[cfg(test)]
mod tests {
    use balloon_core::base::XorHasher;
    use balloon_core::storage::{Mutation, Store, Table};
    use balloon_storage::MemoryStore;

    use super::*;
    use crate::pruning::SingleTargetedCacheResolver;
    use crate::{DefaultHashes, SimpleCache};

    #[test]
    fn insert_sorted_replaces_and_orders() {
        let mut leaves = vec![KvPair::new(vec![0x10], vec![0]), KvPair::new(vec![0x30], vec![0])];
        insert_sorted(&mut leaves, KvPair::new(vec![0x20], vec![1]));
        insert_sorted(&mut leaves, KvPair::new(vec![0x10], vec![2]));
        let keys: Vec<_> = leaves.iter().map(|l| (l.key.clone(), l.value.clone())).collect();
        assert_eq!(
            keys,
            vec![(vec![0x10], vec![2]), (vec![0x20], vec![1]), (vec![0x30], vec![0])]
        );
    }

    #[test]
    fn loads_neighbours_below_the_cache_level() {
        let store = MemoryStore::new();
        store
            .mutate(&[Mutation::new(Table::Index, vec![0x01], vec![0x07])])
            .expect("store accepts mutation");
        let cache = SimpleCache::new();
        let ladder = DefaultHashes::new(&XorHasher);
        let ctx = PruningContext {
            n: 8,
            resolver: SingleTargetedCacheResolver::new(&[0x00], 6),
            cache: &cache,
            store: Some(&store),
            ladder: &ladder,
        };

        let pruned = InsertPruner::new(&[0x00], &[0x08], ctx)
            .prune()
            .expect("pruning succeeds");

        // root(8) -> [0x00](7) -> [0x00](6) collectable, expanded to both leaves.
        let Pruned::Collectable(root) = pruned else {
            panic!("root is collectable");
        };
        let Pruned::Node { left, right, .. } = *root else {
            panic!("root is a node");
        };
        assert!(matches!(*right, Pruned::Cached { .. }));
        let Pruned::Collectable(level7) = *left else {
            panic!("on-path child is collectable");
        };
        let Pruned::Node { left: boundary, .. } = *level7 else {
            panic!("level 7 is a node");
        };
        let Pruned::Collectable(boundary) = *boundary else {
            panic!("cache level node is collectable");
        };
        let mut leaves = Vec::new();
        collect_leaves(&boundary, &mut leaves);
        assert_eq!(leaves, vec![(vec![0x00], vec![0x08]), (vec![0x01], vec![0x07])]);
    }

    fn collect_leaves(node: &Pruned, out: &mut Vec<(Vec<u8>, Vec<u8>)>) {
        match node {
            Pruned::Node { left, right, .. } => {
                collect_leaves(left, out);
                collect_leaves(right, out);
            }
            Pruned::Leaf { pos, value } => out.push((pos.base().to_vec(), value.clone())),
            Pruned::Cached { .. } => {}
            Pruned::Collectable(inner) => collect_leaves(inner, out),
        }
    }
}
