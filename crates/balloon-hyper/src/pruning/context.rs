use balloon_core::storage::{KvPair, Store, Table};

use super::Pruned;
use crate::{Cache, DefaultHashes, HyperError, Position};

/// Decides, for one target key, which positions come from the cache.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SingleTargetedCacheResolver<'a> {
    target: &'a [u8],
    cache_level: u16,
}

impl<'a> SingleTargetedCacheResolver<'a> {
    pub(crate) const fn new(target: &'a [u8], cache_level: u16) -> Self {
        Self {
            target,
            cache_level,
        }
    }

    pub(crate) fn is_on_path(&self, pos: &Position) -> bool {
        pos.contains(self.target)
    }

    /// Off-path nodes at or above the cache level are read, never recomputed.
    pub(crate) fn should_get_from_cache(&self, pos: &Position) -> bool {
        pos.height() >= self.cache_level && !self.is_on_path(pos)
    }

    /// On-path nodes at or above the cache level are written back after an insert.
    pub(crate) fn should_cache(&self, pos: &Position) -> bool {
        pos.height() >= self.cache_level && self.is_on_path(pos)
    }

    /// The on-path node at the cache level is rebuilt from the leaf index.
    pub(crate) fn should_load_leaves(&self, pos: &Position) -> bool {
        pos.height() == self.cache_level && self.is_on_path(pos)
    }
}

/// Everything a pruner needs to resolve a node.
pub(crate) struct PruningContext<'a> {
    pub(crate) n: u16,
    pub(crate) resolver: SingleTargetedCacheResolver<'a>,
    pub(crate) cache: &'a dyn Cache,
    pub(crate) store: Option<&'a dyn Store>,
    pub(crate) ladder: &'a DefaultHashes,
}

impl PruningContext<'_> {
    pub(crate) fn root(&self) -> Position {
        Position::root(self.n)
    }

    pub(crate) fn default_at(&self, pos: Position) -> Result<Pruned, HyperError> {
        let digest = self.ladder.at(pos.height())?.clone();
        Ok(Pruned::Cached { pos, digest })
    }

    /// Cached digest of `pos`, or the empty-subtree digest on a miss.
    pub(crate) fn cached_or_default(&self, pos: Position) -> Result<Pruned, HyperError> {
        match self.cache.get(&pos) {
            Some(digest) => Ok(Pruned::Cached { pos, digest }),
            None => self.default_at(pos),
        }
    }

    /// Indexed leaves inside the span of `pos`, ascending by key.
    pub(crate) fn load_leaves(&self, pos: &Position) -> Result<Vec<KvPair>, HyperError> {
        let store = self
            .store
            .ok_or(HyperError::InvalidState("pruning needs a store to load leaves"))?;
        let first = pos.first_descendant();
        let last = pos.last_descendant();
        Ok(store.get_range(Table::Index, first.base(), last.base())?)
    }

    /// Expand the subtree at `pos` from the sorted leaves it contains.
    pub(crate) fn from_leaves(&self, pos: Position, leaves: &[KvPair]) -> Result<Pruned, HyperError> {
        if leaves.is_empty() {
            return self.default_at(pos);
        }
        if pos.is_leaf() {
            return match leaves {
                [leaf] => Ok(Pruned::Leaf {
                    pos,
                    value: leaf.value.clone(),
                }),
                _ => Err(HyperError::InvalidState("several leaves share one key")),
            };
        }
        let (left, right) = (pos.left()?, pos.right()?);
        let (left_leaves, right_leaves) = split_leaves(leaves, &right);
        let left = self.from_leaves(left, left_leaves)?;
        let right = self.from_leaves(right, right_leaves)?;
        Ok(Pruned::node(pos, left, right))
    }
}

/// Split sorted leaves into those left of `right.base()` and the rest.
pub(crate) fn split_leaves<'l>(
    leaves: &'l [KvPair],
    right: &Position,
) -> (&'l [KvPair], &'l [KvPair]) {
    let mid = leaves.partition_point(|leaf| leaf.key.as_slice() < right.base());
    leaves.split_at(mid)
}
