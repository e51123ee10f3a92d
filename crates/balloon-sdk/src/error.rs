use balloon_core::base::HasherKind;
use balloon_core::storage::StorageError;
use balloon_hyper::HyperError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur when operating a balloon.
#[derive(Error, Debug)]
pub enum BalloonError {
    /// The hyper tree failed.
    #[error(transparent)]
    Hyper(#[from] HyperError),

    /// The store failed outside of a tree operation.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A bookkeeping entry in the store cannot be decoded.
    #[error("Corrupt meta entry `{key}`: {reason}")]
    CorruptMeta {
        /// Meta key of the entry.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The store was written with another hasher.
    #[error("Store was built with hasher `{stored}`, not `{requested}`")]
    HasherMismatch {
        /// Hasher recorded in the store.
        stored: String,
        /// Hasher asked for.
        requested: HasherKind,
    },

    /// The balloon was closed.
    #[error("Balloon is closed")]
    Closed,
}

impl BalloonError {
    /// Whether the error reports an event that was never added.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Hyper(e) if e.is_not_found())
    }
}
