//! InMemoryPersistence - map-backed strategy for testing and development.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{PersistenceError, PersistenceStrategy, RecordOrKey};
use crate::collection::CollectionHandle;
use crate::record::{primary_key_of, PrimaryKey, Properties, Record, RecordHandle};

/// Strategy whose "remote" side is a map of property bags.
///
/// `load` treats an object in `params` as an equality filter on the remote
/// bags. Calls given a scope name keep that scope's member keys in step.
/// Clone-friendly via Arc: clones share the remote map.
pub struct InMemoryPersistence<R> {
    remote: Arc<RwLock<BTreeMap<PrimaryKey, Properties>>>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for InMemoryPersistence<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            _marker: PhantomData,
        }
    }
}

impl<R: Record> Default for InMemoryPersistence<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> InMemoryPersistence<R> {
    /// Create a strategy with an empty remote side.
    pub fn new() -> Self {
        Self {
            remote: Arc::new(RwLock::new(BTreeMap::new())),
            _marker: PhantomData,
        }
    }

    /// Put bags on the remote side without touching any collection.
    pub fn seed<I>(&self, bags: I) -> Result<(), PersistenceError>
    where
        I: IntoIterator<Item = Properties>,
    {
        let mut remote = self.write_remote()?;
        for bag in bags {
            let key = primary_key_of::<R>(&bag)?;
            remote.insert(key, bag);
        }
        Ok(())
    }

    pub fn remote_get(
        &self,
        key: impl Into<PrimaryKey>,
    ) -> Result<Option<Properties>, PersistenceError> {
        Ok(self.read_remote()?.get(&key.into()).cloned())
    }

    pub fn remote_len(&self) -> Result<usize, PersistenceError> {
        Ok(self.read_remote()?.len())
    }

    fn read_remote(
        &self,
    ) -> Result<RwLockReadGuard<'_, BTreeMap<PrimaryKey, Properties>>, PersistenceError> {
        self.remote
            .read()
            .map_err(|_| PersistenceError::Transport("remote map poisoned".into()))
    }

    fn write_remote(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<PrimaryKey, Properties>>, PersistenceError> {
        self.remote
            .write()
            .map_err(|_| PersistenceError::Transport("remote map poisoned".into()))
    }
}

fn matches_filter(bag: &Properties, filter: Option<&Properties>) -> bool {
    filter.map_or(true, |filter| {
        filter.iter().all(|(field, value)| bag.get(field) == Some(value))
    })
}

#[async_trait]
impl<R: Record> PersistenceStrategy<R> for InMemoryPersistence<R> {
    async fn load(
        &self,
        collection: &CollectionHandle<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let filter = match &params {
            Some(Value::Object(filter)) => Some(filter),
            _ => None,
        };
        let bags: Vec<Properties> = self
            .read_remote()?
            .values()
            .filter(|bag| matches_filter(bag, filter))
            .cloned()
            .collect();

        let handles = collection.set_many(bags.clone())?;
        if let Some(name) = scope_name {
            let keys = handles
                .iter()
                .map(RecordHandle::primary_key)
                .collect::<Result<Vec<_>, _>>()?;
            collection.provide_scope(Some(name), None)?.set_primary_keys(keys)?;
        }

        Ok(Value::Array(bags.into_iter().map(Value::Object).collect()))
    }

    async fn load_one(
        &self,
        collection: &CollectionHandle<R>,
        target: RecordOrKey<R>,
        _params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let key = target.primary_key()?;
        let bag = self
            .read_remote()?
            .get(&key)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound {
                collection: R::COLLECTION.to_string(),
                key: key.to_string(),
            })?;

        collection.set(bag.clone())?;
        if let Some(name) = scope_name {
            collection.provide_scope(Some(name), None)?.add_primary_keys([key])?;
        }

        Ok(Value::Object(bag))
    }

    async fn save_one(
        &self,
        collection: &CollectionHandle<R>,
        record: RecordHandle<R>,
        _params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let key = record.primary_key()?;
        let bag = record.properties()?;
        self.write_remote()?.insert(key.clone(), bag.clone());

        collection.set_record(record)?;
        if let Some(name) = scope_name {
            collection.provide_scope(Some(name), None)?.add_primary_keys([key])?;
        }

        Ok(Value::Object(bag))
    }

    async fn destroy_one(
        &self,
        collection: &CollectionHandle<R>,
        record: RecordHandle<R>,
        _params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let key = record.primary_key()?;
        self.write_remote()?.remove(&key);

        collection.unset(key.clone())?;
        let scope = scope_name
            .map(|name| collection.get_scope(name))
            .transpose()?
            .flatten();
        if let Some(scope) = scope {
            scope.remove_primary_keys([key])?;
        }

        Ok(Value::Null)
    }
}
