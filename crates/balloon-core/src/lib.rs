//! Balloon base primitives and storage contracts.

/// Digests and the hashers that produce them.
pub mod base;
/// Tables, mutations and the backing store contract.
pub mod storage;
