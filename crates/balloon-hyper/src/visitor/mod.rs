//! Post-order strategies over a pruned view.

mod audit_path;
mod caching;
mod compute;
mod print;

pub(crate) use audit_path::AuditPathVisitor;
pub(crate) use caching::Caching;
pub(crate) use compute::ComputeHash;
pub(crate) use print::PrintVisitor;

use balloon_core::base::Digest;

use crate::Position;

/// One strategy of the post-order walk over a pruned view.
pub(crate) trait Visitor {
    type Output;

    fn visit_node(&mut self, pos: &Position, left: Self::Output, right: Self::Output)
    -> Self::Output;

    fn visit_leaf(&mut self, pos: &Position, value: &[u8]) -> Self::Output;

    fn visit_cached(&mut self, pos: &Position, digest: &Digest) -> Self::Output;

    /// Called after the wrapped node was visited, with its result.
    fn visit_collectable(&mut self, pos: &Position, result: Self::Output) -> Self::Output;
}
