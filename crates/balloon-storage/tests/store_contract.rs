#![allow(missing_docs)]

use balloon_core::storage::{Mutation, StorageError, Store, Table};
use balloon_storage::{MemoryStore, SledStore};
use tempfile::tempdir;

fn stores() -> Vec<(&'static str, Box<dyn Store>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        (
            "sled",
            Box::new(SledStore::temporary().expect("temporary sled store should open")),
        ),
    ]
}

fn put(store: &dyn Store, table: Table, key: &[u8], value: &[u8]) {
    store
        .mutate(&[Mutation::new(table, key, value)])
        .expect("mutate should succeed");
}

#[test]
fn get_distinguishes_missing_keys() {
    for (name, store) in stores() {
        put(&*store, Table::HyperCache, b"Key1", b"Value1");
        put(&*store, Table::Index, b"Key2", b"Value2");

        let stored = store
            .get(Table::HyperCache, b"Key1")
            .unwrap_or_else(|e| panic!("{name}: existing key should be found: {e}"));
        assert_eq!(stored.key, b"Key1".to_vec(), "{name}");
        assert_eq!(stored.value, b"Value1".to_vec(), "{name}");

        assert!(
            matches!(
                store.get(Table::HyperCache, b"Key2"),
                Err(StorageError::KeyNotFound)
            ),
            "{name}: key of another table must not be visible"
        );
    }
}

#[test]
fn range_is_inclusive_on_both_ends() {
    let cases: [(usize, u8, u8); 6] = [
        (40, 10, 50),
        (0, 1, 9),
        (11, 1, 20),
        (10, 40, 60),
        (0, 60, 100),
        (0, 20, 10),
    ];

    for (name, store) in stores() {
        for i in 10_u8..50 {
            put(&*store, Table::Index, &[i], b"Value");
        }
        // Same keys in another table must not widen any range.
        put(&*store, Table::Meta, &[15], b"Other");

        for (size, start, end) in cases {
            let range = store
                .get_range(Table::Index, &[start], &[end])
                .expect("range should succeed");
            assert_eq!(range.len(), size, "{name}: range {start}..={end}");
            assert!(
                range.windows(2).all(|w| w[0].key < w[1].key),
                "{name}: range must be ascending"
            );
        }
    }
}

#[test]
fn get_all_streams_one_table() {
    for (name, store) in stores() {
        let mutations: Vec<Mutation> = (0_u16..1000)
            .map(|i| Mutation::new(Table::HyperCache, i.to_be_bytes(), i.to_be_bytes()))
            .collect();
        store.mutate(&mutations).expect("batch should apply");
        put(&*store, Table::Index, b"elsewhere", b"x");

        let all: Vec<_> = store
            .get_all(Table::HyperCache)
            .expect("scan should start")
            .collect::<Result<_, _>>()
            .expect("every entry should read");
        assert_eq!(all.len(), 1000, "{name}");
        assert_eq!(all[999].key, 999_u16.to_be_bytes().to_vec(), "{name}");
    }
}

#[test]
fn get_last_returns_greatest_key_per_table() {
    for (name, store) in stores() {
        assert!(
            matches!(store.get_last(Table::Index), Err(StorageError::KeyNotFound)),
            "{name}: empty table has no last entry"
        );

        for table in [Table::HyperCache, Table::Index] {
            for i in 0_u64..20 {
                put(&*store, table, &i.to_be_bytes(), &i.to_be_bytes());
            }
        }

        let last = store
            .get_last(Table::HyperCache)
            .expect("table is not empty");
        assert_eq!(last.key, 19_u64.to_be_bytes().to_vec(), "{name}");
        assert_eq!(last.value, 19_u64.to_be_bytes().to_vec(), "{name}");
    }
}

#[test]
fn sled_store_survives_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("balloon.db");

    {
        let store = SledStore::open(&path).expect("store should open");
        put(&store, Table::Index, b"event", &7_u64.to_be_bytes());
        store.flush().expect("flush should succeed");
    }

    let reopened = SledStore::open(&path).expect("store should reopen");
    let entry = reopened
        .get(Table::Index, b"event")
        .expect("entry should persist");
    assert_eq!(entry.value, 7_u64.to_be_bytes().to_vec());
}
