//! RecordStore - the keyed map behind a collection.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::record::{PrimaryKey, RecordHandle};

/// Map from primary key to the one live instance for that key.
///
/// Not synchronized; the owning collection guards it. The store never locks
/// a record, so no record lock is ever taken under the collection lock.
pub(crate) struct RecordStore<R> {
    records: BTreeMap<PrimaryKey, RecordHandle<R>>,
}

impl<R> RecordStore<R> {
    pub(crate) fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    pub(crate) fn has(&self, key: &PrimaryKey) -> bool {
        self.records.contains_key(key)
    }

    pub(crate) fn get(&self, key: &PrimaryKey) -> Option<RecordHandle<R>> {
        self.records.get(key).cloned()
    }

    /// Lookup in the order of `keys`; absent keys are skipped.
    pub(crate) fn get_many<'k>(
        &self,
        keys: impl IntoIterator<Item = &'k PrimaryKey>,
    ) -> Vec<RecordHandle<R>> {
        keys.into_iter()
            .filter_map(|key| self.records.get(key).cloned())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn handles(&self) -> Vec<RecordHandle<R>> {
        self.records.values().cloned().collect()
    }

    pub(crate) fn keys(&self) -> Vec<PrimaryKey> {
        self.records.keys().cloned().collect()
    }

    /// Store `handle` under `key` unless the key is taken, in which case the
    /// instance already there comes back as the error.
    pub(crate) fn insert(
        &mut self,
        key: PrimaryKey,
        handle: RecordHandle<R>,
    ) -> Result<(), RecordHandle<R>> {
        match self.records.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
            Entry::Occupied(slot) => Err(slot.get().clone()),
        }
    }

    /// Store exactly this instance under `key`, replacing any other.
    pub(crate) fn set_record(&mut self, key: PrimaryKey, handle: RecordHandle<R>) {
        self.records.insert(key, handle);
    }

    /// Move the instance at `old` to `new`. Returns false when `old` is absent.
    pub(crate) fn rekey(&mut self, old: &PrimaryKey, new: PrimaryKey) -> bool {
        match self.records.remove(old) {
            Some(handle) => {
                self.records.insert(new, handle);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, key: &PrimaryKey) -> bool {
        self.records.remove(key).is_some()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }
}
