//! Collection - keyed record store, scope registry and persistence binding.
//!
//! ## Example
//!
//! ```ignore
//! use record_collection::{Collection, InMemoryPersistence};
//!
//! let users = Collection::<User>::with_persistence_strategy(Arc::new(InMemoryPersistence::new()));
//! let ada = users.set(props(json!({"id": 1, "name": "Ada"})))?;
//! users.save_one(ada.clone(), None, None)?.await?;
//! assert!(users.has(1)?);
//! ```

mod handle;
mod persistence;
mod scopes;
pub(crate) mod store;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::CollectionError;
use crate::events::{self, ChangeEvents};
use crate::persistence::PersistenceStrategy;
use crate::record::{primary_key_of, PrimaryKey, Properties, Record, RecordHandle};
use crate::scope::Scope;
use store::RecordStore;

pub use handle::CollectionHandle;

/// Records and scopes, guarded together by one lock.
///
/// Record locks are only ever taken after this lock is released.
pub(crate) struct State<R> {
    pub(crate) records: RecordStore<R>,
    pub(crate) scopes: BTreeMap<String, Scope<R>>,
}

/// Everything clones of one collection share.
pub(crate) struct Shared<R> {
    state: RwLock<State<R>>,
    strategy: RwLock<Option<Arc<dyn PersistenceStrategy<R>>>>,
    scope_seq: AtomicU64,
    events: ChangeEvents,
}

impl<R> Shared<R> {
    pub(crate) fn read_state(&self) -> Result<RwLockReadGuard<'_, State<R>>, CollectionError> {
        self.state
            .read()
            .map_err(|_| CollectionError::LockPoisoned("collection read"))
    }

    pub(crate) fn write_state(&self) -> Result<RwLockWriteGuard<'_, State<R>>, CollectionError> {
        self.state
            .write()
            .map_err(|_| CollectionError::LockPoisoned("collection write"))
    }
}

/// In-memory store of `R` records keyed by primary key.
///
/// Clone-friendly via Arc: clones share records, scopes and the persistence
/// strategy binding.
pub struct Collection<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: Record> Default for Collection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Collection<R> {
    /// Create an empty collection with no persistence strategy.
    pub fn new() -> Self {
        Self::from_strategy(None)
    }

    /// Create an empty collection bound to `strategy`.
    pub fn with_persistence_strategy(strategy: Arc<dyn PersistenceStrategy<R>>) -> Self {
        Self::from_strategy(Some(strategy))
    }

    fn from_strategy(strategy: Option<Arc<dyn PersistenceStrategy<R>>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(State {
                    records: RecordStore::new(),
                    scopes: BTreeMap::new(),
                }),
                strategy: RwLock::new(strategy),
                scope_seq: AtomicU64::new(0),
                events: ChangeEvents::new(),
            }),
        }
    }

    /// The collection name of the record type.
    pub fn name(&self) -> &'static str {
        R::COLLECTION
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared<R>> {
        Arc::downgrade(&self.shared)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn has(&self, key: impl Into<PrimaryKey>) -> Result<bool, CollectionError> {
        Ok(self.shared.read_state()?.records.has(&key.into()))
    }

    /// The stored instance for `key`, if any. Not a copy.
    pub fn get(
        &self,
        key: impl Into<PrimaryKey>,
    ) -> Result<Option<RecordHandle<R>>, CollectionError> {
        Ok(self.shared.read_state()?.records.get(&key.into()))
    }

    /// The stored instances for `keys`, in the order given. Keys with no record
    /// are left out of the result rather than reported.
    pub fn get_many<I, K>(&self, keys: I) -> Result<Vec<RecordHandle<R>>, CollectionError>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        let keys: Vec<PrimaryKey> = keys.into_iter().map(Into::into).collect();
        Ok(self.shared.read_state()?.records.get_many(&keys))
    }

    /// Records whose serialized `prop` equals `value`, in store order.
    pub fn where_prop_eq(
        &self,
        prop: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<RecordHandle<R>>, CollectionError> {
        let value = value.into();
        let mut matches = Vec::new();
        for handle in self.items()? {
            if handle.properties()?.get(prop) == Some(&value) {
                matches.push(handle);
            }
        }
        Ok(matches)
    }

    pub fn size(&self) -> Result<usize, CollectionError> {
        Ok(self.shared.read_state()?.records.len())
    }

    pub fn items(&self) -> Result<Vec<RecordHandle<R>>, CollectionError> {
        Ok(self.shared.read_state()?.records.handles())
    }

    pub fn items_primary_keys(&self) -> Result<Vec<PrimaryKey>, CollectionError> {
        Ok(self.shared.read_state()?.records.keys())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Add or update one record from a property bag.
    ///
    /// When a record with the bag's key exists it is updated in place and the
    /// same instance is returned, so existing handles see the new values.
    pub fn set(&self, properties: Properties) -> Result<RecordHandle<R>, CollectionError> {
        let key = primary_key_of::<R>(&properties)?;
        let existing = self.shared.read_state()?.records.get(&key);
        let (handle, inserted) = match existing {
            Some(existing) => (update_in_place(existing, properties)?, false),
            None => {
                let record = R::from_properties(properties.clone())?;
                let candidate = RecordHandle::new(record);
                let taken = self
                    .shared
                    .write_state()?
                    .records
                    .insert(key.clone(), candidate.clone());
                match taken {
                    Ok(()) => (candidate, true),
                    // stored by another writer since the lookup
                    Err(existing) => (update_in_place(existing, properties)?, false),
                }
            }
        };
        debug!(collection = R::COLLECTION, key = %key, inserted, "record set");
        self.shared.events.emit(events::RECORD_SET, key.to_string());
        Ok(handle)
    }

    /// Store exactly this instance under its own primary key, replacing
    /// whatever was there.
    pub fn set_record(
        &self,
        record: impl Into<RecordHandle<R>>,
    ) -> Result<RecordHandle<R>, CollectionError> {
        let handle = record.into();
        let key = handle.primary_key()?;
        self.shared
            .write_state()?
            .records
            .set_record(key.clone(), handle.clone());
        debug!(collection = R::COLLECTION, key = %key, "record instance set");
        self.shared.events.emit(events::RECORD_SET, key.to_string());
        Ok(handle)
    }

    /// `set` each bag in turn; the result follows input order.
    ///
    /// Every bag's primary key is checked before anything is stored. A bag
    /// that fails later (a property of the wrong type) stops the batch; the
    /// bags before it stay stored and their `record_set` events have fired.
    pub fn set_many<I>(&self, bags: I) -> Result<Vec<RecordHandle<R>>, CollectionError>
    where
        I: IntoIterator<Item = Properties>,
    {
        let bags: Vec<Properties> = bags.into_iter().collect();
        for bag in &bags {
            primary_key_of::<R>(bag)?;
        }

        let mut handles = Vec::with_capacity(bags.len());
        for bag in bags {
            handles.push(self.set(bag)?);
        }
        trace!(collection = R::COLLECTION, count = handles.len(), "records set");
        Ok(handles)
    }

    /// Re-index the record stored under `old` to `new`.
    ///
    /// A record already stored under `new` is replaced. Scopes listing `old`
    /// list `new` afterwards, once. Nothing happens when `old` is absent.
    pub fn update_record_primary_key(
        &self,
        old: impl Into<PrimaryKey>,
        new: impl Into<PrimaryKey>,
    ) -> Result<(), CollectionError> {
        let (old, new) = (old.into(), new.into());
        if old == new {
            return Ok(());
        }
        {
            let mut state = self.shared.write_state()?;
            if !state.records.rekey(&old, new.clone()) {
                return Ok(());
            }
            for scope in state.scopes.values() {
                scope.rekey(&old, &new)?;
            }
        }
        debug!(collection = R::COLLECTION, old = %old, new = %new, "record re-keyed");
        self.shared.events.emit(events::RECORD_REKEYED, new.to_string());
        Ok(())
    }

    /// Remove the record stored under `key`. Absent keys are ignored.
    pub fn unset(&self, key: impl Into<PrimaryKey>) -> Result<&Self, CollectionError> {
        let key = key.into();
        let removed = self.shared.write_state()?.records.remove(&key);
        if removed {
            debug!(collection = R::COLLECTION, key = %key, "record unset");
            self.shared.events.emit(events::RECORD_UNSET, key.to_string());
        }
        Ok(self)
    }

    pub fn unset_many<I, K>(&self, keys: I) -> Result<&Self, CollectionError>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        let removed: Vec<PrimaryKey> = {
            let mut state = self.shared.write_state()?;
            keys.into_iter()
                .map(Into::into)
                .filter(|key| state.records.remove(key))
                .collect()
        };
        trace!(collection = R::COLLECTION, count = removed.len(), "records unset");
        for key in removed {
            self.shared.events.emit(events::RECORD_UNSET, key.to_string());
        }
        Ok(self)
    }

    /// Remove every record. Scopes stay registered.
    pub fn clear(&self) -> Result<&Self, CollectionError> {
        let removed = self.shared.write_state()?.records.clear();
        debug!(collection = R::COLLECTION, removed, "records cleared");
        self.shared.events.emit(events::RECORDS_CLEARED, R::COLLECTION.to_string());
        Ok(self)
    }

    /// Remove every record and every scope. The persistence strategy stays bound.
    pub fn reset(&self) -> Result<(), CollectionError> {
        let (records, scopes) = {
            let mut state = self.shared.write_state()?;
            let scopes = state.scopes.len();
            state.scopes.clear();
            (state.records.clear(), scopes)
        };
        debug!(collection = R::COLLECTION, records, scopes, "collection reset");
        self.shared.events.emit(events::RECORDS_CLEARED, R::COLLECTION.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Change notifications
    // ------------------------------------------------------------------

    /// Listen for one of the change events in [`crate::events`]. The listener
    /// receives the affected primary key (or the collection name for
    /// `records_cleared`) on an emitter thread. Returns the listener id.
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, event: &str, listener: F) -> Result<String, CollectionError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.shared.events.on(event, listener)
    }

    /// Remove a listener registered with `on_change`. Returns whether it existed.
    #[cfg(feature = "emitter")]
    pub fn remove_change_listener(&self, id: &str) -> Result<bool, CollectionError> {
        self.shared.events.remove(id)
    }
}

fn update_in_place<R: Record>(
    handle: RecordHandle<R>,
    properties: Properties,
) -> Result<RecordHandle<R>, CollectionError> {
    handle.write()?.update_properties(properties)?;
    Ok(handle)
}
