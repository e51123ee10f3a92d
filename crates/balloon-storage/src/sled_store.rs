use std::path::Path;

use balloon_core::storage::{KvIter, KvPair, Mutation, StorageError, Store, Table};
use tracing::debug;

/// Store on top of an embedded sled database.
///
/// All tables share the default sled tree; the table prefix keeps them apart.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
}

fn backend(error: sled::Error) -> StorageError {
    StorageError::Backend(Box::new(error))
}

fn to_pair(table: Table, physical: &[u8], value: &[u8]) -> Result<KvPair, StorageError> {
    table
        .strip(physical)
        .map(|key| KvPair::new(key, value))
        .ok_or_else(|| StorageError::Backend("scanned key outside of its table".into()))
}

impl SledStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    /// Returns an error if sled cannot open the directory, e.g. because another process
    /// holds it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        debug!(path = %path.as_ref().display(), "Opening sled store");
        let db = sled::open(path).map_err(backend)?;
        Ok(Self { db })
    }

    /// Open a throwaway database that is removed when dropped.
    ///
    /// # Errors
    /// Returns an error if sled cannot create the temporary database.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(backend)?;
        Ok(Self { db })
    }
}

impl Store for SledStore {
    fn get(&self, table: Table, key: &[u8]) -> Result<KvPair, StorageError> {
        self.db
            .get(table.prefixed(key))
            .map_err(backend)?
            .map(|value| KvPair::new(key, value.to_vec()))
            .ok_or(StorageError::KeyNotFound)
    }

    fn mutate(&self, mutations: &[Mutation]) -> Result<(), StorageError> {
        let mut batch = sled::Batch::default();
        for mutation in mutations {
            batch.insert(
                mutation.table.prefixed(&mutation.key),
                mutation.value.clone(),
            );
        }
        self.db.apply_batch(batch).map_err(backend)
    }

    fn get_range(
        &self,
        table: Table,
        start: &[u8],
        end: &[u8],
    ) -> Result<Vec<KvPair>, StorageError> {
        if start > end {
            return Ok(Vec::new());
        }
        self.db
            .range(table.prefixed(start)..=table.prefixed(end))
            .map(|entry| {
                let (physical, value) = entry.map_err(backend)?;
                to_pair(table, &physical, &value)
            })
            .collect()
    }

    fn get_all(&self, table: Table) -> Result<KvIter<'_>, StorageError> {
        let iter = self.db.scan_prefix([table.prefix()]).map(move |entry| {
            let (physical, value) = entry.map_err(backend)?;
            to_pair(table, &physical, &value)
        });
        Ok(Box::new(iter))
    }

    fn get_last(&self, table: Table) -> Result<KvPair, StorageError> {
        let (physical, value) = self
            .db
            .scan_prefix([table.prefix()])
            .next_back()
            .ok_or(StorageError::KeyNotFound)?
            .map_err(backend)?;
        to_pair(table, &physical, &value)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map(|_| ()).map_err(backend)
    }
}
