use super::{Pruned, PruningContext};
use crate::{HyperError, Position};

/// Prunes the tree for recomputing a root from an audit path.
///
/// The context cache is the audit path itself and no store is consulted: siblings come
/// from the path (or the default ladder) and the target leaf holds the claimed value.
pub(crate) struct VerifyPruner<'a> {
    value: &'a [u8],
    ctx: PruningContext<'a>,
}

impl<'a> VerifyPruner<'a> {
    pub(crate) const fn new(value: &'a [u8], ctx: PruningContext<'a>) -> Self {
        Self { value, ctx }
    }

    pub(crate) fn prune(&self) -> Result<Pruned, HyperError> {
        self.traverse(self.ctx.root())
    }

    fn traverse(&self, pos: Position) -> Result<Pruned, HyperError> {
        if pos.is_leaf() {
            return Ok(Pruned::Leaf {
                pos,
                value: self.value.to_vec(),
            });
        }
        let (left, right) = (pos.left()?, pos.right()?);
        let (left, right) = if self.ctx.resolver.is_on_path(&left) {
            (self.traverse(left)?, self.ctx.cached_or_default(right)?)
        } else {
            (self.ctx.cached_or_default(left)?, self.traverse(right)?)
        };
        Ok(Pruned::node(pos, left, right))
    }
}
