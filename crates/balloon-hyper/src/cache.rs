//! Digest caches for the upper levels of the tree.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use balloon_core::base::Digest;

use crate::Position;

/// Read side of a digest cache.
pub trait Cache {
    /// Cached digest of a position, if any.
    fn get(&self, pos: &Position) -> Option<Digest>;
}

/// A cache the tree writes back into after inserts.
///
/// Implementations must make `get` and `put` atomic, since readers of the tree share it.
pub trait ModifiableCache: Cache + Send + Sync {
    /// Store the digest of a position.
    fn put(&self, pos: Position, digest: Digest);

    /// Drop every cached digest.
    fn clear(&self);

    /// Number of cached positions.
    fn len(&self) -> usize;

    /// Whether nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory cache.
#[derive(Debug, Default)]
pub struct SimpleCache {
    cached: RwLock<HashMap<Position, Digest>>,
}

impl SimpleCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// A poisoned map is still consistent: every write is a single insert.
impl Cache for SimpleCache {
    fn get(&self, pos: &Position) -> Option<Digest> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pos)
            .cloned()
    }
}

impl ModifiableCache for SimpleCache {
    fn put(&self, pos: Position, digest: Digest) {
        self.cached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pos, digest);
    }

    fn clear(&self) {
        self.cached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn len(&self) -> usize {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let cache = SimpleCache::new();
        let pos = Position::root(8);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&pos), None);

        cache.put(pos.clone(), Digest::from([0x01]));
        cache.put(pos.clone(), Digest::from([0x02]));
        assert_eq!(cache.get(&pos), Some(Digest::from([0x02])));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&pos), None);
    }
}
