//! Persistence - the protocol a collection delegates remote work to.
//!
//! A strategy owns transport, wire format and retries. The collection hands
//! it a [`CollectionHandle`] and the strategy writes the authoritative result
//! back through it before its future completes.

mod in_memory;

use std::fmt;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::collection::CollectionHandle;
use crate::error::CollectionError;
use crate::record::{PrimaryKey, Record, RecordHandle};

pub use in_memory::InMemoryPersistence;

/// What a persistence call resolves to: the strategy's own result, unchanged.
pub type PersistenceFuture = BoxFuture<'static, Result<Value, PersistenceError>>;

/// Remote load/save/destroy for records of type `R`.
///
/// One strategy may be shared by several collections.
#[async_trait]
pub trait PersistenceStrategy<R>: Send + Sync {
    /// Load records, optionally filtered by `params`, into the collection.
    async fn load(
        &self,
        collection: &CollectionHandle<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError>;

    /// Load or refresh a single record.
    async fn load_one(
        &self,
        collection: &CollectionHandle<R>,
        target: RecordOrKey<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError>;

    /// Persist a record.
    async fn save_one(
        &self,
        collection: &CollectionHandle<R>,
        record: RecordHandle<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError>;

    /// Delete a record remotely.
    async fn destroy_one(
        &self,
        collection: &CollectionHandle<R>,
        record: RecordHandle<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError>;
}

/// A stored record or just its primary key, as accepted by `load_one`.
pub enum RecordOrKey<R> {
    Record(RecordHandle<R>),
    Key(PrimaryKey),
}

impl<R: Record> RecordOrKey<R> {
    pub fn primary_key(&self) -> Result<PrimaryKey, CollectionError> {
        match self {
            RecordOrKey::Record(handle) => handle.primary_key(),
            RecordOrKey::Key(key) => Ok(key.clone()),
        }
    }
}

impl<R> From<RecordHandle<R>> for RecordOrKey<R> {
    fn from(handle: RecordHandle<R>) -> Self {
        RecordOrKey::Record(handle)
    }
}

impl<R> From<&RecordHandle<R>> for RecordOrKey<R> {
    fn from(handle: &RecordHandle<R>) -> Self {
        RecordOrKey::Record(handle.clone())
    }
}

impl<R> From<PrimaryKey> for RecordOrKey<R> {
    fn from(key: PrimaryKey) -> Self {
        RecordOrKey::Key(key)
    }
}

impl<R> From<i64> for RecordOrKey<R> {
    fn from(key: i64) -> Self {
        RecordOrKey::Key(key.into())
    }
}

impl<R> From<i32> for RecordOrKey<R> {
    fn from(key: i32) -> Self {
        RecordOrKey::Key(key.into())
    }
}

impl<R> From<&str> for RecordOrKey<R> {
    fn from(key: &str) -> Self {
        RecordOrKey::Key(key.into())
    }
}

impl<R> From<String> for RecordOrKey<R> {
    fn from(key: String) -> Self {
        RecordOrKey::Key(key.into())
    }
}

/// Error type for persistence strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The remote side has no record for the key.
    NotFound { collection: String, key: String },
    /// The remote side refused the operation.
    Rejected(String),
    /// The remote side could not be reached or answered garbage.
    Transport(String),
    /// Writing the result back into the collection failed.
    Collection(CollectionError),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::NotFound { collection, key } => {
                write!(f, "remote record not found: {}:{}", collection, key)
            }
            PersistenceError::Rejected(msg) => write!(f, "persistence rejected: {}", msg),
            PersistenceError::Transport(msg) => write!(f, "persistence transport error: {}", msg),
            PersistenceError::Collection(err) => write!(f, "collection error: {}", err),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Collection(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CollectionError> for PersistenceError {
    fn from(err: CollectionError) -> Self {
        PersistenceError::Collection(err)
    }
}
