use std::sync::{Arc, Mutex, PoisonError};

use balloon_core::base::{Digest, Hasher, HasherKind};
use balloon_core::storage::{Mutation, Store, Table};
use balloon_hyper::{HyperTree, QueryProof, SimpleCache};
use balloon_storage::{MemoryStore, SledStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::BalloonError;
use crate::config::{StorageConfig, ValidatedBalloonConfig};

const META_VERSION: &str = "version";
const META_ROOT: &str = "root";
const META_HASHER: &str = "hasher";

/// State of the log right after one insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Digest of the inserted event.
    pub event_digest: Digest,
    /// Root of the hyper tree after the insertion.
    pub hyper_digest: Digest,
    /// Version assigned to the event.
    pub version: u64,
}

/// Proof that an event belongs to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    /// Digest of the queried event.
    pub event_digest: Digest,
    /// Hyper tree proof of the digest.
    pub proof: QueryProof,
    /// Latest version of the log when the proof was built.
    pub current_version: u64,
    /// Root the proof was built against.
    pub hyper_digest: Option<Digest>,
}

impl MembershipProof {
    /// Version the event was added at.
    #[must_use]
    pub const fn event_version(&self) -> u64 {
        self.proof.value
    }

    /// Check the proof against a snapshot of the log.
    ///
    /// The event must have been added no later than the snapshot, and the snapshot root
    /// must be the one the proof was built against.
    #[must_use]
    pub fn verify(&self, snapshot: &Snapshot) -> bool {
        if self.event_digest != self.proof.key {
            debug!("Proof key does not match the event digest");
            return false;
        }
        if self.event_version() > snapshot.version {
            debug!(
                event = self.event_version(),
                snapshot = snapshot.version,
                "Event is newer than the snapshot"
            );
            return false;
        }
        self.proof
            .verify(self.event_version(), &self.event_digest, &snapshot.hyper_digest)
    }

    /// Like [`MembershipProof::verify`], also checking that the proof is about `event`.
    #[must_use]
    pub fn verify_event(&self, event: &[u8], snapshot: &Snapshot) -> bool {
        self.proof.hasher.build().digest(&[event]) == self.event_digest && self.verify(snapshot)
    }
}

#[derive(Debug)]
struct Head {
    /// Version of the next event.
    next_version: u64,
    root: Option<Digest>,
}

/// Append-only event log over a store.
pub struct Balloon {
    store: Arc<dyn Store>,
    hasher: Arc<dyn Hasher>,
    tree: HyperTree<SimpleCache>,
    head: Mutex<Option<Head>>,
}

impl Balloon {
    /// Open a balloon over `store`, resuming from whatever it already holds.
    ///
    /// # Errors
    /// If the store cannot be read, its meta entries are corrupt, or it was written with
    /// another hasher.
    #[instrument(skip_all, fields(hasher = %hasher))]
    pub fn open(store: Arc<dyn Store>, hasher: HasherKind) -> Result<Self, BalloonError> {
        if let Some(stored) = read_meta(store.as_ref(), META_HASHER)? {
            let stored = String::from_utf8_lossy(&stored).into_owned();
            if stored != hasher.as_str_name() {
                return Err(BalloonError::HasherMismatch {
                    stored,
                    requested: hasher,
                });
            }
        }

        let hash = hasher.build();
        let tree = HyperTree::new(store.clone(), Arc::new(SimpleCache::new()), hash.clone())?;
        let warmed = tree.rebuild_cache()?;

        let next_version = read_meta(store.as_ref(), META_VERSION)?
            .map(|bytes| decode_version(&bytes))
            .transpose()?
            .unwrap_or_default();
        let root = read_meta(store.as_ref(), META_ROOT)?.map(Digest::new);

        info!(version = next_version, warmed, "Opened balloon");
        Ok(Self {
            store,
            hasher: hash,
            tree,
            head: Mutex::new(Some(Head { next_version, root })),
        })
    }

    /// Open the balloon described by a validated configuration.
    ///
    /// # Errors
    /// If the configured store cannot be opened, or see [`Balloon::open`].
    pub fn open_from_config(config: &ValidatedBalloonConfig) -> Result<Self, BalloonError> {
        let store: Arc<dyn Store> = match &config.storage {
            StorageConfig::Memory => Arc::new(MemoryStore::new()),
            StorageConfig::Sled { path } => Arc::new(SledStore::open(path)?),
        };
        Self::open(store, config.hasher)
    }

    /// Hasher of the underlying tree.
    #[must_use]
    pub fn hasher(&self) -> HasherKind {
        self.hasher.kind()
    }

    /// Add an event and return the snapshot right after it.
    ///
    /// Tree and bookkeeping updates are applied to the store in one batch.
    ///
    /// # Errors
    /// If the tree or the store fails, or the balloon is closed. When the store rejects
    /// the batch, the tree cache is reloaded from the store so the event leaves no trace.
    /// If that reload fails too, the balloon closes itself.
    #[instrument(skip_all)]
    pub fn add(&self, event: &[u8]) -> Result<Snapshot, BalloonError> {
        let mut guard = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        let head = guard.as_mut().ok_or(BalloonError::Closed)?;

        let event_digest = self.hasher.digest(&[event]);
        let version = head.next_version;
        let next_version = version
            .checked_add(1)
            .ok_or_else(|| BalloonError::CorruptMeta {
                key: META_VERSION,
                reason: "version counter exhausted".to_owned(),
            })?;

        let (root, mut mutations) = self.tree.add(&event_digest, version)?;
        mutations.push(Mutation::new(
            Table::Meta,
            META_VERSION.as_bytes(),
            next_version.to_be_bytes(),
        ));
        mutations.push(Mutation::new(Table::Meta, META_ROOT.as_bytes(), root.as_bytes()));
        if version == 0 {
            mutations.push(Mutation::new(
                Table::Meta,
                META_HASHER.as_bytes(),
                self.hasher.kind().as_str_name().as_bytes(),
            ));
        }
        if let Err(e) = self.store.mutate(&mutations) {
            warn!(error = %e, event = %event_digest, version, "Store rejected the batch");
            if let Err(reload) = self.tree.rebuild_cache() {
                warn!(error = %reload, "Failed to reload the tree cache, closing the balloon");
                guard.take();
            }
            return Err(e.into());
        }

        head.next_version = next_version;
        head.root = Some(root.clone());
        info!(event = %event_digest, version, root = %root, "Added event");

        Ok(Snapshot {
            event_digest,
            hyper_digest: root,
            version,
        })
    }

    /// Build the membership proof of `event` against the latest root.
    ///
    /// # Errors
    /// [`BalloonError::is_not_found`] holds if the event was never added. Otherwise a
    /// tree or store failure, or the balloon is closed.
    #[instrument(skip_all)]
    pub fn query_membership(&self, event: &[u8]) -> Result<MembershipProof, BalloonError> {
        let guard = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        let head = guard.as_ref().ok_or(BalloonError::Closed)?;

        let event_digest = self.hasher.digest(&[event]);
        let proof = self.tree.query_membership(&event_digest)?;
        debug!(event = %event_digest, version = proof.value, "Built membership proof");

        Ok(MembershipProof {
            event_digest,
            proof,
            current_version: head.next_version.saturating_sub(1),
            hyper_digest: head.root.clone(),
        })
    }

    /// Check a membership proof against a snapshot. Needs no balloon.
    #[must_use]
    pub fn verify(proof: &MembershipProof, snapshot: &Snapshot) -> bool {
        proof.verify(snapshot)
    }

    /// Version the next event will get, which is also the number of events.
    ///
    /// # Errors
    /// If the balloon is closed.
    pub fn version(&self) -> Result<u64, BalloonError> {
        let guard = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.as_ref().ok_or(BalloonError::Closed)?.next_version)
    }

    /// Latest root, `None` before the first event.
    ///
    /// # Errors
    /// If the balloon is closed.
    pub fn root(&self) -> Result<Option<Digest>, BalloonError> {
        let guard = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.as_ref().ok_or(BalloonError::Closed)?.root.clone())
    }

    /// Flush the store and release the tree. Every later call fails.
    ///
    /// # Errors
    /// If the balloon is already closed or the flush fails.
    pub fn close(&self) -> Result<(), BalloonError> {
        let mut guard = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        guard.take().ok_or(BalloonError::Closed)?;
        self.store.flush()?;
        self.tree.close()?;
        info!("Closed balloon");
        Ok(())
    }
}

fn read_meta(store: &dyn Store, key: &'static str) -> Result<Option<Vec<u8>>, BalloonError> {
    match store.get(Table::Meta, key.as_bytes()) {
        Ok(entry) => Ok(Some(entry.value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn decode_version(bytes: &[u8]) -> Result<u64, BalloonError> {
    <[u8; 8]>::try_from(bytes)
        .map(u64::from_be_bytes)
        .map_err(|_| BalloonError::CorruptMeta {
            key: META_VERSION,
            reason: format!("expected 8 bytes, got {}", bytes.len()),
        })
}
