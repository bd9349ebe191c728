//! CollectionHandle - the view of a collection a persistence strategy gets.

use crate::error::CollectionError;
use crate::record::{PrimaryKey, Properties, Record, RecordHandle};
use crate::scope::Scope;

use super::Collection;

/// Narrow handle passed to persistence strategies.
///
/// Lets a strategy write authoritative state back into the store and record
/// scope membership, without reaching the rest of the collection surface
/// (strategy binding, persistence calls, reset).
pub struct CollectionHandle<R> {
    collection: Collection<R>,
}

impl<R> Clone for CollectionHandle<R> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}

impl<R: Record> CollectionHandle<R> {
    pub(crate) fn new(collection: Collection<R>) -> Self {
        Self { collection }
    }

    pub fn name(&self) -> &'static str {
        R::COLLECTION
    }

    pub fn has(&self, key: impl Into<PrimaryKey>) -> Result<bool, CollectionError> {
        self.collection.has(key)
    }

    pub fn get(
        &self,
        key: impl Into<PrimaryKey>,
    ) -> Result<Option<RecordHandle<R>>, CollectionError> {
        self.collection.get(key)
    }

    pub fn set(&self, properties: Properties) -> Result<RecordHandle<R>, CollectionError> {
        self.collection.set(properties)
    }

    pub fn set_many<I>(&self, bags: I) -> Result<Vec<RecordHandle<R>>, CollectionError>
    where
        I: IntoIterator<Item = Properties>,
    {
        self.collection.set_many(bags)
    }

    pub fn set_record(
        &self,
        record: impl Into<RecordHandle<R>>,
    ) -> Result<RecordHandle<R>, CollectionError> {
        self.collection.set_record(record)
    }

    /// For keys assigned by the remote side on save.
    pub fn update_record_primary_key(
        &self,
        old: impl Into<PrimaryKey>,
        new: impl Into<PrimaryKey>,
    ) -> Result<(), CollectionError> {
        self.collection.update_record_primary_key(old, new)
    }

    pub fn unset(&self, key: impl Into<PrimaryKey>) -> Result<&Self, CollectionError> {
        self.collection.unset(key)?;
        Ok(self)
    }

    pub fn unset_many<I, K>(&self, keys: I) -> Result<&Self, CollectionError>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        self.collection.unset_many(keys)?;
        Ok(self)
    }

    pub fn get_scope(&self, name: &str) -> Result<Option<Scope<R>>, CollectionError> {
        self.collection.get_scope(name)
    }

    pub fn provide_scope(
        &self,
        name: Option<&str>,
        params: Option<Properties>,
    ) -> Result<Scope<R>, CollectionError> {
        self.collection.provide_scope(name, params)
    }
}
