//! Versioned in-memory entity store
//!
//! Backed by a concurrent hash map. Every record carries a monotonically
//! increasing version; [`MemStore::update`] is a compare-and-swap on that
//! version, so a writer that read a stale record cannot silently clobber a
//! concurrent commit.

use crate::error::{Result, StoreError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// A storable entity with a stable primary key
pub trait Entity: Clone + Send + Sync + 'static {
    /// Primary key of this record
    fn id(&self) -> Uuid;
}

/// A record plus the version it was read at
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The stored record
    pub record: T,
    /// Version counter at read time; starts at 1 on insert
    pub version: u64,
}

/// Concurrent in-memory store for one entity type
pub struct MemStore<T: Entity> {
    records: DashMap<Uuid, Versioned<T>>,
}

impl<T: Entity> MemStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Insert a new record at version 1
    pub fn insert(&self, record: T) -> Result<()> {
        let id = record.id();
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(id)),
            Entry::Vacant(slot) => {
                slot.insert(Versioned { record, version: 1 });
                Ok(())
            }
        }
    }

    /// Fetch a record by id
    pub fn get(&self, id: Uuid) -> Result<T> {
        self.records
            .get(&id)
            .map(|entry| entry.value().record.clone())
            .ok_or(StoreError::NotFound(id))
    }

    /// Fetch a record together with its current version
    pub fn get_versioned(&self, id: Uuid) -> Result<Versioned<T>> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    /// Collect every record matching a predicate
    pub fn find<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.records
            .iter()
            .filter(|entry| predicate(&entry.record))
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// Replace a record if the stored version still matches
    ///
    /// Returns the new version on success. A [`StoreError::VersionConflict`]
    /// means another writer committed since `expected_version` was read; the
    /// caller must re-read and re-validate before retrying.
    pub fn update(&self, expected_version: u64, record: T) -> Result<u64> {
        let id = record.id();
        match self.records.get_mut(&id) {
            Some(mut entry) => {
                if entry.version != expected_version {
                    return Err(StoreError::VersionConflict {
                        id,
                        expected: expected_version,
                        found: entry.version,
                    });
                }
                entry.record = record;
                entry.version += 1;
                Ok(entry.version)
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// Remove a record, returning it
    pub fn remove(&self, id: Uuid) -> Result<T> {
        self.records
            .remove(&id)
            .map(|(_, versioned)| versioned.record)
            .ok_or(StoreError::NotFound(id))
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Entity> Default for MemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: Uuid,
        label: String,
    }

    impl Entity for Widget {
        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn widget(label: &str) -> Widget {
        Widget {
            id: Uuid::now_v7(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = MemStore::new();
        let w = widget("a");

        store.insert(w.clone()).unwrap();
        assert_eq!(store.get(w.id).unwrap(), w);
        assert_eq!(store.get_versioned(w.id).unwrap().version, 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = MemStore::new();
        let w = widget("a");

        store.insert(w.clone()).unwrap();
        assert_eq!(store.insert(w.clone()), Err(StoreError::Duplicate(w.id)));
    }

    #[test]
    fn test_update_bumps_version() {
        let store = MemStore::new();
        let mut w = widget("a");
        store.insert(w.clone()).unwrap();

        w.label = "b".to_string();
        let version = store.update(1, w.clone()).unwrap();
        assert_eq!(version, 2);
        assert_eq!(store.get(w.id).unwrap().label, "b");
    }

    #[test]
    fn test_stale_update_conflicts() {
        let store = MemStore::new();
        let mut w = widget("a");
        store.insert(w.clone()).unwrap();

        w.label = "b".to_string();
        store.update(1, w.clone()).unwrap();

        // A second writer that also read version 1 must lose.
        w.label = "c".to_string();
        let err = store.update(1, w.clone()).unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict {
                id: w.id,
                expected: 1,
                found: 2,
            }
        );
        assert_eq!(store.get(w.id).unwrap().label, "b");
    }

    #[test]
    fn test_find_filters() {
        let store = MemStore::new();
        store.insert(widget("keep")).unwrap();
        store.insert(widget("keep")).unwrap();
        store.insert(widget("drop")).unwrap();

        let kept = store.find(|w| w.label == "keep");
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_remove() {
        let store = MemStore::new();
        let w = widget("a");
        store.insert(w.clone()).unwrap();

        assert_eq!(store.remove(w.id).unwrap(), w);
        assert_eq!(store.get(w.id), Err(StoreError::NotFound(w.id)));
    }
}
