use balloon_core::storage::KvPair;

use super::context::split_leaves;
use super::{Pruned, PruningContext};
use crate::{HyperError, Position};

/// Prunes the tree for collecting the audit path of `key`.
///
/// Every sibling of the target path, above and below the cache level, is wrapped in
/// [`Pruned::Collectable`]. Nothing is written back.
pub(crate) struct SearchPruner<'a> {
    ctx: PruningContext<'a>,
}

impl<'a> SearchPruner<'a> {
    pub(crate) const fn new(ctx: PruningContext<'a>) -> Self {
        Self { ctx }
    }

    pub(crate) fn prune(&self) -> Result<Pruned, HyperError> {
        self.traverse(self.ctx.root())
    }

    fn traverse(&self, pos: Position) -> Result<Pruned, HyperError> {
        if self.ctx.resolver.should_load_leaves(&pos) {
            let leaves = self.ctx.load_leaves(&pos)?;
            return self.traverse_leaves(pos, &leaves);
        }
        let (left, right) = (pos.left()?, pos.right()?);
        let (left, right) = if self.ctx.resolver.is_on_path(&left) {
            (self.traverse(left)?, self.sibling(right)?)
        } else {
            (self.sibling(left)?, self.traverse(right)?)
        };
        Ok(Pruned::node(pos, left, right))
    }

    fn sibling(&self, pos: Position) -> Result<Pruned, HyperError> {
        Ok(self.ctx.cached_or_default(pos)?.collectable())
    }

    fn traverse_leaves(&self, pos: Position, leaves: &[KvPair]) -> Result<Pruned, HyperError> {
        if pos.is_leaf() {
            return self.ctx.from_leaves(pos, leaves);
        }
        let (left, right) = (pos.left()?, pos.right()?);
        let (left_leaves, right_leaves) = split_leaves(leaves, &right);
        let (left, right) = if self.ctx.resolver.is_on_path(&left) {
            (
                self.traverse_leaves(left, left_leaves)?,
                self.ctx.from_leaves(right, right_leaves)?.collectable(),
            )
        } else {
            (
                self.ctx.from_leaves(left, left_leaves)?.collectable(),
                self.traverse_leaves(right, right_leaves)?,
            )
        };
        Ok(Pruned::node(pos, left, right))
    }
}
