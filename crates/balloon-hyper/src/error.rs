use balloon_core::storage::StorageError;
use thiserror::Error;

/// Errors that can occur when operating the hyper tree.
#[derive(Error, Debug)]
pub enum HyperError {
    /// The event digest is not in the leaf index.
    #[error("Event digest not found in the index")]
    NotFound,

    /// The backing store failed. Not retried here.
    #[error("Storage error: {0}")]
    Io(#[from] StorageError),

    /// The operation is not valid in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// The hasher cannot address a tree.
    #[error("Hasher bit length {0} must be a non-zero multiple of 8")]
    InvalidHasher(u16),

    /// A digest does not match the width of the tree.
    #[error("Digest length mismatch: expected {expected} bytes, got {actual}")]
    DigestLength {
        /// Bytes expected by the tree.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },

    /// A stored version is not 8 bytes long.
    #[error("Malformed version entry of {0} bytes")]
    MalformedVersion(usize),

    /// A stored cache key does not decode into a position.
    #[error("Malformed position key of {0} bytes")]
    MalformedPosition(usize),
}

impl HyperError {
    /// Whether the error reports a missing event rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
