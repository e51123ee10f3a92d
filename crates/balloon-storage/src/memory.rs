use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use balloon_core::storage::{KvIter, KvPair, Mutation, StorageError, Store, Table};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// Ordered in-memory store.
///
/// Batches are applied under a single write lock, which makes them atomic with respect to
/// readers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Entries>, StorageError> {
        self.entries.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Entries>, StorageError> {
        self.entries.write().map_err(|_| StorageError::Poisoned)
    }

    fn table_entries(entries: &Entries, table: Table) -> impl Iterator<Item = KvPair> + '_ {
        entries
            .range(vec![table.prefix()]..)
            .map_while(move |(physical, value)| {
                table
                    .strip(physical)
                    .map(|key| KvPair::new(key, value.clone()))
            })
    }
}

impl Store for MemoryStore {
    fn get(&self, table: Table, key: &[u8]) -> Result<KvPair, StorageError> {
        self.read()?
            .get(&table.prefixed(key))
            .map(|value| KvPair::new(key, value.clone()))
            .ok_or(StorageError::KeyNotFound)
    }

    fn mutate(&self, mutations: &[Mutation]) -> Result<(), StorageError> {
        let mut entries = self.write()?;
        for mutation in mutations {
            entries.insert(mutation.table.prefixed(&mutation.key), mutation.value.clone());
        }
        Ok(())
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
        let entries = self.read()?;
        let range = entries
            .range(table.prefixed(start)..=table.prefixed(end))
            .filter_map(|(physical, value)| {
                table
                    .strip(physical)
                    .map(|key| KvPair::new(key, value.clone()))
            })
            .collect();
        Ok(range)
    }

    fn get_all(&self, table: Table) -> Result<KvIter<'_>, StorageError> {
        let snapshot: Vec<KvPair> = Self::table_entries(&*self.read()?, table).collect();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn get_last(&self, table: Table) -> Result<KvPair, StorageError> {
        Self::table_entries(&*self.read()?, table)
            .last()
            .ok_or(StorageError::KeyNotFound)
    }
}
