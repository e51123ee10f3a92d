use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use balloon_core::base::{Digest, Hasher};
use balloon_core::storage::{Mutation, Store, Table};
use tracing::{Level, debug, instrument, trace};

use crate::pruning::{
    InsertPruner, Pruned, PruningContext, SearchPruner, SingleTargetedCacheResolver,
    VerifyPruner,
};
use crate::visitor::{AuditPathVisitor, Caching, ComputeHash, PrintVisitor};
use crate::{DefaultHashes, HyperError, ModifiableCache, Position, QueryProof, SimpleCache};

const CLOSED: &str = "hyper tree is closed";
const POISONED: &str = "hyper tree lock poisoned";

/// Lowest height whose digests are cached, for a tree of width `n`.
///
/// The top `max(2, n / 10)` levels are cached; everything below is rebuilt from the
/// leaf index on demand.
#[must_use]
pub const fn cache_level(n: u16) -> u16 {
    let cached = if n / 10 > 2 { n / 10 } else { 2 };
    n.saturating_sub(cached)
}

struct TreeState<C> {
    store: Arc<dyn Store>,
    cache: Arc<C>,
    hasher: Arc<dyn Hasher>,
    ladder: DefaultHashes,
}

impl<C: ModifiableCache> TreeState<C> {
    fn context<'a>(&'a self, target: &'a [u8], n: u16, level: u16) -> PruningContext<'a> {
        PruningContext {
            n,
            resolver: SingleTargetedCacheResolver::new(target, level),
            cache: self.cache.as_ref(),
            store: Some(self.store.as_ref()),
            ladder: &self.ladder,
        }
    }
}

/// Authenticated sparse tree keyed by event digests.
///
/// Inserts take the lock exclusively; queries and verifications share it. The tree never
/// writes to the store itself: [`HyperTree::add`] returns the mutations for the caller to
/// apply, so they can be batched with other bookkeeping.
pub struct HyperTree<C: ModifiableCache = SimpleCache> {
    n: u16,
    cache_level: u16,
    state: RwLock<Option<TreeState<C>>>,
}

impl<C: ModifiableCache> HyperTree<C> {
    /// Build a tree over `store`, caching upper digests in `cache`.
    ///
    /// # Errors
    /// [`HyperError::InvalidHasher`] when the hasher width is zero or not a whole number of
    /// bytes.
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<C>,
        hasher: Arc<dyn Hasher>,
    ) -> Result<Self, HyperError> {
        let n = hasher.bit_len();
        if n == 0 || n % 8 != 0 {
            return Err(HyperError::InvalidHasher(n));
        }
        let ladder = DefaultHashes::new(hasher.as_ref());
        let cache_level = cache_level(n);
        debug!(n, cache_level, hasher = %hasher.kind(), "Built hyper tree");
        Ok(Self {
            n,
            cache_level,
            state: RwLock::new(Some(TreeState {
                store,
                cache,
                hasher,
                ladder,
            })),
        })
    }

    /// Width of the tree in bits.
    #[must_use]
    pub const fn n(&self) -> u16 {
        self.n
    }

    /// Lowest cached height.
    #[must_use]
    pub const fn cache_level(&self) -> u16 {
        self.cache_level
    }

    /// Insert `event_digest` at `version` and return the new root with the mutations that
    /// persist it.
    ///
    /// The batch holds one [`Table::HyperCache`] entry per recomputed cached node and the
    /// [`Table::Index`] entry of the event. The in-memory cache is updated before return.
    ///
    /// # Errors
    /// [`HyperError::Io`] if the leaf index cannot be read, [`HyperError::DigestLength`]
    /// for a digest of the wrong width, [`HyperError::InvalidState`] after close.
    #[instrument(skip_all, fields(event = %event_digest, version = version))]
    pub fn add(
        &self,
        event_digest: &Digest,
        version: u64,
    ) -> Result<(Digest, Vec<Mutation>), HyperError> {
        let guard = self.write()?;
        let state = guard.as_ref().ok_or(HyperError::InvalidState(CLOSED))?;
        self.check_width(event_digest)?;

        let value = version.to_be_bytes();
        let ctx = state.context(event_digest.as_bytes(), self.n, self.cache_level);
        let pruned = InsertPruner::new(event_digest.as_bytes(), &value, ctx).prune()?;
        trace_shape(&pruned);

        let mut visitor = Caching::new(ComputeHash::new(state.hasher.as_ref()));
        let root = pruned.post_order(&mut visitor);
        let cached = visitor.into_cached();

        let mut mutations = Vec::with_capacity(cached.len().saturating_add(1));
        for (pos, digest) in cached {
            mutations.push(Mutation::new(Table::HyperCache, pos.bytes(), digest.as_bytes()));
            state.cache.put(pos, digest);
        }
        mutations.push(Mutation::new(Table::Index, event_digest.as_bytes(), value));

        debug!(root = %root, mutations = mutations.len(), "Inserted event");
        Ok((root, mutations))
    }

    /// Build the membership proof of an indexed event.
    ///
    /// # Errors
    /// [`HyperError::NotFound`] if the event was never added, [`HyperError::Io`] on store
    /// failure, [`HyperError::InvalidState`] after close.
    #[instrument(skip_all, fields(event = %event_digest))]
    pub fn query_membership(&self, event_digest: &Digest) -> Result<QueryProof, HyperError> {
        let guard = self.read()?;
        let state = guard.as_ref().ok_or(HyperError::InvalidState(CLOSED))?;
        self.check_width(event_digest)?;

        let stored = state
            .store
            .get(Table::Index, event_digest.as_bytes())
            .map_err(|e| {
                if e.is_not_found() {
                    HyperError::NotFound
                } else {
                    HyperError::Io(e)
                }
            })?;
        let version = decode_version(&stored.value)?;

        let ctx = state.context(event_digest.as_bytes(), self.n, self.cache_level);
        let pruned = SearchPruner::new(ctx).prune()?;
        trace_shape(&pruned);

        let mut visitor = AuditPathVisitor::new(ComputeHash::new(state.hasher.as_ref()));
        let root = pruned.post_order(&mut visitor);
        let audit_path = visitor.into_path();

        debug!(root = %root, version, siblings = audit_path.len(), "Collected audit path");
        Ok(QueryProof {
            key: event_digest.clone(),
            value: version,
            audit_path,
            hasher: state.hasher.kind(),
        })
    }

    /// Recompute the root from `proof` alone and compare it with `expected_root`.
    ///
    /// A proof that does not match, including one built with another hasher or for
    /// digests of the wrong width, yields `Ok(false)`.
    ///
    /// # Errors
    /// [`HyperError::InvalidState`] after close.
    #[instrument(skip_all, fields(event = %event_digest, version = version))]
    pub fn verify_membership(
        &self,
        proof: &QueryProof,
        version: u64,
        event_digest: &Digest,
        expected_root: &Digest,
    ) -> Result<bool, HyperError> {
        let guard = self.read()?;
        let state = guard.as_ref().ok_or(HyperError::InvalidState(CLOSED))?;
        if proof.hasher != state.hasher.kind() {
            debug!(proof = %proof.hasher, tree = %state.hasher.kind(), "Hasher mismatch");
            return Ok(false);
        }
        if self.check_width(event_digest).is_err() || self.check_width(expected_root).is_err() {
            debug!("Digest width mismatch");
            return Ok(false);
        }

        let value = version.to_be_bytes();
        let ctx = PruningContext {
            n: self.n,
            resolver: SingleTargetedCacheResolver::new(event_digest.as_bytes(), self.cache_level),
            cache: &proof.audit_path,
            store: None,
            ladder: &state.ladder,
        };
        let pruned = match VerifyPruner::new(&value, ctx).prune() {
            Ok(pruned) => pruned,
            Err(e) => {
                debug!(error = %e, "Proof does not fit the tree");
                return Ok(false);
            }
        };
        trace_shape(&pruned);

        let root = pruned.post_order(&mut ComputeHash::new(state.hasher.as_ref()));
        let valid = &root == expected_root;
        debug!(root = %root, valid, "Verified membership");
        Ok(valid)
    }

    /// Replace the in-memory cache with every persisted cache entry.
    ///
    /// Entries put by an insert whose batch never reached the store are dropped. Returns
    /// the number of entries loaded.
    ///
    /// # Errors
    /// [`HyperError::Io`] on store failure, [`HyperError::MalformedPosition`] for a key
    /// that is not a position of this tree, [`HyperError::InvalidState`] after close.
    #[instrument(skip_all)]
    pub fn rebuild_cache(&self) -> Result<usize, HyperError> {
        let guard = self.write()?;
        let state = guard.as_ref().ok_or(HyperError::InvalidState(CLOSED))?;
        state.cache.clear();
        let mut loaded: usize = 0;
        for entry in state.store.get_all(Table::HyperCache)? {
            let entry = entry?;
            let pos = Position::from_bytes(&entry.key, self.n)?;
            state.cache.put(pos, Digest::new(entry.value));
            loaded = loaded.saturating_add(1);
        }
        debug!(loaded, "Rebuilt hyper cache");
        Ok(loaded)
    }

    /// Release the store, cache and hasher. Every later call fails.
    ///
    /// # Errors
    /// [`HyperError::InvalidState`] if the tree is already closed.
    pub fn close(&self) -> Result<(), HyperError> {
        let mut guard = self.write()?;
        guard.take().ok_or(HyperError::InvalidState(CLOSED))?;
        debug!("Closed hyper tree");
        Ok(())
    }

    fn check_width(&self, digest: &Digest) -> Result<(), HyperError> {
        let expected = usize::from(self.n / 8);
        if digest.len() == expected {
            Ok(())
        } else {
            Err(HyperError::DigestLength {
                expected,
                actual: digest.len(),
            })
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<TreeState<C>>>, HyperError> {
        self.state
            .read()
            .map_err(|_| HyperError::InvalidState(POISONED))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Option<TreeState<C>>>, HyperError> {
        self.state
            .write()
            .map_err(|_| HyperError::InvalidState(POISONED))
    }
}

fn decode_version(bytes: &[u8]) -> Result<u64, HyperError> {
    <[u8; 8]>::try_from(bytes)
        .map(u64::from_be_bytes)
        .map_err(|_| HyperError::MalformedVersion(bytes.len()))
}

fn trace_shape(pruned: &Pruned) {
    if tracing::enabled!(Level::TRACE) {
        trace!(shape = %pruned.post_order(&mut PrintVisitor), "Pruned tree");
    }
}
