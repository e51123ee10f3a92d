//! Digests of empty subtrees, one per height.

use balloon_core::base::{Digest, Hasher};

use crate::HyperError;

/// Digests of entirely empty subtrees, one per height below the root.
///
/// `ladder[0] = H(0x00, 0x00)` stands for an empty leaf slot and
/// `ladder[h] = H(ladder[h-1], ladder[h-1])` for an empty subtree rooted at height `h`.
/// The root is always on the path of an operation, so no entry exists for height `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultHashes(Vec<Digest>);

impl DefaultHashes {
    /// Build the ladder for `hasher`. Runs in `O(N)`.
    #[must_use]
    pub fn new(hasher: &dyn Hasher) -> Self {
        let n = usize::from(hasher.bit_len());
        let mut ladder: Vec<Digest> = Vec::with_capacity(n);
        if n == 0 {
            return Self(ladder);
        }
        let mut current = hasher.digest(&[&[0x00], &[0x00]]);
        for _ in 1..n {
            let next = hasher.digest(&[current.as_bytes(), current.as_bytes()]);
            ladder.push(current);
            current = next;
        }
        ladder.push(current);
        Self(ladder)
    }

    /// Default digest of an empty subtree rooted at `height`.
    ///
    /// # Errors
    /// [`HyperError::InvalidState`] for heights at or above the root.
    pub fn at(&self, height: u16) -> Result<&Digest, HyperError> {
        self.0
            .get(usize::from(height))
            .ok_or(HyperError::InvalidState("no default digest at the root height"))
    }

    /// Number of rungs, equal to the tree width.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ladder has no rungs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use balloon_core::base::{HasherKind, Sha256Hasher};

    use super::*;

    #[derive(Debug, Default)]
    struct CountingHasher(AtomicUsize);

    impl Hasher for CountingHasher {
        fn digest(&self, parts: &[&[u8]]) -> Digest {
            self.0.fetch_add(1, Ordering::Relaxed);
            Sha256Hasher.digest(parts)
        }

        fn bit_len(&self) -> u16 {
            256
        }

        fn kind(&self) -> HasherKind {
            HasherKind::Sha256
        }
    }

    #[test]
    fn each_rung_hashes_the_previous_twice() {
        let hasher = Sha256Hasher;
        let ladder = DefaultHashes::new(&hasher);
        assert_eq!(ladder.len(), 256);
        assert_eq!(
            ladder.at(0).expect("rung 0 exists"),
            &hasher.digest(&[&[0x00], &[0x00]])
        );
        for h in 1..256_u16 {
            let prev = ladder.at(h - 1).expect("rung exists");
            assert_eq!(
                ladder.at(h).expect("rung exists"),
                &hasher.digest(&[prev.as_bytes(), prev.as_bytes()])
            );
        }
        assert!(matches!(ladder.at(256), Err(HyperError::InvalidState(_))));
    }

    #[test]
    fn costs_one_hash_per_rung() {
        let hasher = CountingHasher::default();
        let ladder = DefaultHashes::new(&hasher);
        assert_eq!(hasher.0.load(Ordering::Relaxed), ladder.len());
    }
}
