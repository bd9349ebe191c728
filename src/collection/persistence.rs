//! Persistence delegation from a collection to its strategy.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use super::{Collection, CollectionHandle};
use crate::error::CollectionError;
use crate::persistence::{PersistenceFuture, PersistenceStrategy, RecordOrKey};
use crate::record::{Record, RecordHandle};

impl<R: Record> Collection<R> {
    /// Bind the strategy used by `load`, `load_one`, `save_one` and `destroy_one`.
    pub fn set_persistence_strategy(
        &self,
        strategy: Arc<dyn PersistenceStrategy<R>>,
    ) -> Result<&Self, CollectionError> {
        *self
            .shared
            .strategy
            .write()
            .map_err(|_| CollectionError::LockPoisoned("persistence strategy write"))? =
            Some(strategy);
        Ok(self)
    }

    /// The bound strategy, or `MissingPersistenceStrategy`.
    pub fn persistence_strategy(
        &self,
    ) -> Result<Arc<dyn PersistenceStrategy<R>>, CollectionError> {
        self.shared
            .strategy
            .read()
            .map_err(|_| CollectionError::LockPoisoned("persistence strategy read"))?
            .clone()
            .ok_or(CollectionError::MissingPersistenceStrategy {
                collection: R::COLLECTION,
            })
    }

    /// Handle given to strategies.
    pub fn handle(&self) -> CollectionHandle<R> {
        CollectionHandle::new(self.clone())
    }

    /// Ask the strategy to load records into the collection.
    ///
    /// Fails right away when no strategy is bound; otherwise the returned
    /// future resolves to whatever the strategy produces.
    pub fn load(
        &self,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<PersistenceFuture, CollectionError> {
        let strategy = self.persistence_strategy()?;
        let handle = self.handle();
        let scope_name = scope_name.map(str::to_owned);
        debug!(collection = R::COLLECTION, scope = ?scope_name, "delegating load");
        Ok(async move {
            strategy
                .load(&handle, params, scope_name.as_deref())
                .await
        }
        .boxed())
    }

    /// Ask the strategy to load a single record, given as a handle or a key.
    pub fn load_one(
        &self,
        target: impl Into<RecordOrKey<R>>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<PersistenceFuture, CollectionError> {
        let strategy = self.persistence_strategy()?;
        let handle = self.handle();
        let target = target.into();
        let scope_name = scope_name.map(str::to_owned);
        debug!(collection = R::COLLECTION, scope = ?scope_name, "delegating load_one");
        Ok(async move {
            strategy
                .load_one(&handle, target, params, scope_name.as_deref())
                .await
        }
        .boxed())
    }

    /// Ask the strategy to persist `record`.
    pub fn save_one(
        &self,
        record: RecordHandle<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<PersistenceFuture, CollectionError> {
        let strategy = self.persistence_strategy()?;
        let handle = self.handle();
        let scope_name = scope_name.map(str::to_owned);
        debug!(collection = R::COLLECTION, scope = ?scope_name, "delegating save_one");
        Ok(async move {
            strategy
                .save_one(&handle, record, params, scope_name.as_deref())
                .await
        }
        .boxed())
    }

    /// Ask the strategy to delete `record` remotely.
    pub fn destroy_one(
        &self,
        record: RecordHandle<R>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<PersistenceFuture, CollectionError> {
        let strategy = self.persistence_strategy()?;
        let handle = self.handle();
        let scope_name = scope_name.map(str::to_owned);
        debug!(collection = R::COLLECTION, scope = ?scope_name, "delegating destroy_one");
        Ok(async move {
            strategy
                .destroy_one(&handle, record, params, scope_name.as_deref())
                .await
        }
        .boxed())
    }
}
