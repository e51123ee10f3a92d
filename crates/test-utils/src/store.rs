use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use balloon_core::storage::{KvIter, KvPair, Mutation, StorageError, Store, Table};

fn disk_full() -> StorageError {
    StorageError::Backend("disk full".into())
}

/// Store wrapper whose writes and scans can be switched to fail.
pub struct FailingStore {
    inner: Arc<dyn Store>,
    fail_mutate: AtomicBool,
    fail_range: AtomicBool,
    fail_scan: AtomicBool,
}

impl FailingStore {
    /// Wrap `inner`, passing every call through until told otherwise.
    #[must_use]
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            fail_mutate: AtomicBool::new(false),
            fail_range: AtomicBool::new(false),
            fail_scan: AtomicBool::new(false),
        }
    }

    /// Reject every batch with a backend error.
    pub fn fail_mutate(&self, fail: bool) {
        self.fail_mutate.store(fail, Ordering::SeqCst);
    }

    /// Fail `get_range` with a backend error.
    pub fn fail_range(&self, fail: bool) {
        self.fail_range.store(fail, Ordering::SeqCst);
    }

    /// Fail `get_all` with a backend error.
    pub fn fail_scan(&self, fail: bool) {
        self.fail_scan.store(fail, Ordering::SeqCst);
    }
}

impl Store for FailingStore {
    fn get(&self, table: Table, key: &[u8]) -> Result<KvPair, StorageError> {
        self.inner.get(table, key)
    }

    fn mutate(&self, mutations: &[Mutation]) -> Result<(), StorageError> {
        if self.fail_mutate.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.mutate(mutations)
    }

    fn get_range(
        &self,
        table: Table,
        start: &[u8],
        end: &[u8],
    ) -> Result<Vec<KvPair>, StorageError> {
        if self.fail_range.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.get_range(table, start, end)
    }

    fn get_all(&self, table: Table) -> Result<KvIter<'_>, StorageError> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.get_all(table)
    }

    fn get_last(&self, table: Table) -> Result<KvPair, StorageError> {
        self.inner.get_last(table)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.inner.flush()
    }
}
