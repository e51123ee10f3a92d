//! Storage contract shared by the tree engine and the store implementations.
//!
//! Every entry lives under `table_prefix ‖ key`, so one ordered keyspace can hold all
//! tables and range scans never cross a table boundary.

use thiserror::Error;

/// Logical table of the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Cached hyper tree node digests, keyed by `base ‖ height (4-byte LE)`.
    HyperCache,
    /// Leaf index, `event digest → version (8-byte BE)`.
    Index,
    /// Bookkeeping owned by the balloon facade.
    Meta,
}

impl Table {
    /// All tables, in prefix order.
    pub const ALL: [Self; 3] = [Self::HyperCache, Self::Index, Self::Meta];

    /// One-byte namespace of the table.
    #[must_use]
    pub const fn prefix(self) -> u8 {
        match self {
            Self::HyperCache => 0x01,
            Self::Index => 0x02,
            Self::Meta => 0x03,
        }
    }

    /// Build the physical key `prefix ‖ key`.
    #[must_use]
    pub fn prefixed(self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(key.len().saturating_add(1));
        out.push(self.prefix());
        out.extend_from_slice(key);
        out
    }

    /// Strip the table prefix from a physical key, if it belongs to this table.
    #[must_use]
    pub fn strip<'a>(self, physical: &'a [u8]) -> Option<&'a [u8]> {
        match physical.split_first() {
            Some((&prefix, key)) if prefix == self.prefix() => Some(key),
            _ => None,
        }
    }
}

/// A single write of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Target table.
    pub table: Table,
    /// Logical key inside the table.
    pub key: Vec<u8>,
    /// Value to store.
    pub value: Vec<u8>,
}

impl Mutation {
    /// Create a new mutation.
    #[must_use]
    pub fn new(table: Table, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            table,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A key and its value, with the key relative to its table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct KvPair {
    /// Logical key.
    pub key: Vec<u8>,
    /// Stored value.
    pub value: Vec<u8>,
}

impl KvPair {
    /// Create a new pair.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Streaming result of a full-table scan.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<KvPair, StorageError>> + Send + 'a>;

/// Errors raised by a [`Store`].
#[derive(Error, Debug)]
pub enum StorageError {
    /// The requested key does not exist.
    #[error("Key not found")]
    KeyNotFound,

    /// The underlying engine failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    /// Whether the error is a plain miss rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }
}

/// Persistent key-value engine backing the balloon.
///
/// Implementations must apply [`Store::mutate`] batches atomically. Range scans are
/// inclusive on both ends and ascending by key.
pub trait Store: Send + Sync {
    /// Fetch a single entry.
    ///
    /// # Errors
    /// [`StorageError::KeyNotFound`] on a miss, or a backend failure.
    fn get(&self, table: Table, key: &[u8]) -> Result<KvPair, StorageError>;

    /// Atomically apply every mutation of the batch.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the batch. Nothing is applied then.
    fn mutate(&self, mutations: &[Mutation]) -> Result<(), StorageError>;

    /// Entries with `start <= key <= end`, ascending. Empty when `start > end`.
    ///
    /// # Errors
    /// Returns an error on backend failure.
    fn get_range(&self, table: Table, start: &[u8], end: &[u8])
    -> Result<Vec<KvPair>, StorageError>;

    /// Stream every entry of a table, ascending.
    ///
    /// # Errors
    /// Returns an error if the scan cannot be started. Per-entry failures are yielded by
    /// the iterator.
    fn get_all(&self, table: Table) -> Result<KvIter<'_>, StorageError>;

    /// The entry with the greatest key in a table.
    ///
    /// # Errors
    /// [`StorageError::KeyNotFound`] when the table is empty, or a backend failure.
    fn get_last(&self, table: Table) -> Result<KvPair, StorageError>;

    /// Make every applied batch durable.
    ///
    /// # Errors
    /// Returns an error on backend failure.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_distinct_and_ordered() {
        let prefixes: Vec<u8> = Table::ALL.iter().map(|t| t.prefix()).collect();
        assert_eq!(prefixes, vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn prefixed_keys_strip_back() {
        let physical = Table::Index.prefixed(b"key");
        assert_eq!(physical, b"\x02key".to_vec());
        assert_eq!(Table::Index.strip(&physical), Some(&b"key"[..]));
        assert_eq!(Table::HyperCache.strip(&physical), None);
        assert_eq!(Table::Meta.strip(&[]), None);
    }

    #[test]
    fn only_key_not_found_is_a_miss() {
        assert!(StorageError::KeyNotFound.is_not_found());
        assert!(!StorageError::Poisoned.is_not_found());
        let backend = StorageError::Backend("disk on fire".into());
        assert!(!backend.is_not_found());
        assert!(backend.to_string().contains("disk on fire"));
    }
}
