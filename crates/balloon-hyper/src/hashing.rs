//! Domain-separated digest rules for leaves and interior nodes.

use balloon_core::base::{Digest, Hasher};

/// Marker of a leaf slot that holds no value.
pub const EMPTY: &[u8] = &[0x00];

/// Marker of a leaf slot that holds a value.
pub const SET: &[u8] = &[0x01];

/// Digest of a leaf.
///
/// An empty slot hashes `id` alone; an occupied slot also binds its key (`base`).
#[must_use]
pub fn leaf_hash(hasher: &dyn Hasher, id: &[u8], marker: &[u8], base: &[u8]) -> Digest {
    if marker == EMPTY {
        return hasher.digest(&[id]);
    }
    hasher.digest(&[id, base])
}

/// Digest of an interior node.
///
/// Identical children can only come from untouched default subtrees, so they hash as a
/// plain pair. Differing children also bind the node's base and height, which pins the
/// digest to one location of the tree.
#[must_use]
pub fn interior_hash(
    hasher: &dyn Hasher,
    left: &Digest,
    right: &Digest,
    base: &[u8],
    height: &[u8],
) -> Digest {
    if left == right {
        return hasher.digest(&[left.as_bytes(), right.as_bytes()]);
    }
    hasher.digest(&[left.as_bytes(), right.as_bytes(), base, height])
}

#[cfg(test)]
mod tests {
    use balloon_core::base::Sha256Hasher;

    use super::*;

    #[test]
    fn empty_leaf_ignores_its_base() {
        let hasher = Sha256Hasher;
        let a = leaf_hash(&hasher, b"id", EMPTY, &[0x01]);
        let b = leaf_hash(&hasher, b"id", EMPTY, &[0x02]);
        assert_eq!(a, b);
        assert_eq!(a, hasher.digest(&[b"id"]));
    }

    #[test]
    fn set_leaf_binds_its_base() {
        let hasher = Sha256Hasher;
        let a = leaf_hash(&hasher, b"id", SET, &[0x01]);
        let b = leaf_hash(&hasher, b"id", SET, &[0x02]);
        assert_ne!(a, b);
        assert_eq!(a, hasher.digest(&[b"id", &[0x01]]));
    }

    #[test]
    fn equal_children_skip_the_position() {
        let hasher = Sha256Hasher;
        let child = hasher.digest(&[b"child"]);
        let here = interior_hash(&hasher, &child, &child, &[0x00], &[1, 0, 0, 0]);
        let there = interior_hash(&hasher, &child, &child, &[0x80], &[2, 0, 0, 0]);
        assert_eq!(here, there);
        assert_eq!(here, hasher.digest(&[child.as_bytes(), child.as_bytes()]));
    }

    #[test]
    fn differing_children_bind_the_position() {
        let hasher = Sha256Hasher;
        let left = hasher.digest(&[b"left"]);
        let right = hasher.digest(&[b"right"]);
        let here = interior_hash(&hasher, &left, &right, &[0x00], &[1, 0, 0, 0]);
        let moved = interior_hash(&hasher, &left, &right, &[0x80], &[1, 0, 0, 0]);
        let raised = interior_hash(&hasher, &left, &right, &[0x00], &[2, 0, 0, 0]);
        assert_ne!(here, moved);
        assert_ne!(here, raised);
        assert_ne!(here, interior_hash(&hasher, &right, &left, &[0x00], &[1, 0, 0, 0]));
    }
}
