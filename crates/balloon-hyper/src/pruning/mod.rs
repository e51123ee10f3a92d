//! Pruned views of the hyper tree.
//!
//! A pruner walks from the root toward a single target key and keeps only what the
//! operation needs: the target path, the siblings hanging off it, and the subtrees below
//! the cache level that hold indexed leaves. Everything else collapses into a known digest.

mod context;
mod insert;
mod search;
mod verify;

pub(crate) use context::{PruningContext, SingleTargetedCacheResolver};
pub(crate) use insert::InsertPruner;
pub(crate) use search::SearchPruner;
pub(crate) use verify::VerifyPruner;

use balloon_core::base::Digest;

use crate::Position;
use crate::visitor::Visitor;

/// One node of a pruned view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pruned {
    /// Interior node whose digest is recomputed from its children.
    Node {
        pos: Position,
        left: Box<Self>,
        right: Box<Self>,
    },
    /// Occupied leaf holding the encoded version.
    Leaf { pos: Position, value: Vec<u8> },
    /// Node whose digest is already known: cached, defaulted or taken from a proof.
    Cached { pos: Position, digest: Digest },
    /// Node whose digest the visitor must report back.
    Collectable(Box<Self>),
}

impl Pruned {
    pub(crate) fn pos(&self) -> &Position {
        match self {
            Self::Node { pos, .. } | Self::Leaf { pos, .. } | Self::Cached { pos, .. } => pos,
            Self::Collectable(inner) => inner.pos(),
        }
    }

    /// Fold the view bottom-up.
    pub(crate) fn post_order<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Node { pos, left, right } => {
                let left = left.post_order(visitor);
                let right = right.post_order(visitor);
                visitor.visit_node(pos, left, right)
            }
            Self::Leaf { pos, value } => visitor.visit_leaf(pos, value),
            Self::Cached { pos, digest } => visitor.visit_cached(pos, digest),
            Self::Collectable(inner) => {
                let result = inner.post_order(visitor);
                visitor.visit_collectable(inner.pos(), result)
            }
        }
    }

    pub(crate) fn collectable(self) -> Self {
        Self::Collectable(Box::new(self))
    }

    pub(crate) fn node(pos: Position, left: Self, right: Self) -> Self {
        Self::Node {
            pos,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
