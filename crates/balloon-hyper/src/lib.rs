//! Sparse, bit-addressed authenticated tree over the whole digest key space.
//!
//! Every event digest addresses one leaf of a binary tree of height `N`, where `N` is the
//! bit length of the hasher. Empty subtrees are never materialized: their digests come
//! from a ladder of default hashes built once per tree. Each operation prunes the tree
//! down to the nodes it needs for a single target leaf and folds them post-order:
//!
//! - [`HyperTree::add`] inserts a leaf and returns the new root plus the store mutations,
//! - [`HyperTree::query_membership`] collects the audit path of an indexed event,
//! - [`HyperTree::verify_membership`] recomputes a root from an audit path alone.

mod cache;
mod error;
mod hashing;
mod ladder;
mod navigation;
mod proof;
mod pruning;
mod tree;
mod visitor;

pub use cache::{Cache, ModifiableCache, SimpleCache};
pub use error::HyperError;
pub use hashing::{EMPTY, SET, interior_hash, leaf_hash};
pub use ladder::DefaultHashes;
pub use navigation::Position;
pub use proof::{AuditPath, QueryProof};
pub use tree::{HyperTree, cache_level};
