//! Scopes - named, parameterized views over a collection.
//!
//! A scope remembers which primary keys belong to it (usually filled in by a
//! persistence strategy when it loads "into" the scope) and resolves them
//! against its collection every time `items` is read. Records that have left
//! the collection simply drop out of the view.
//!
//! ## Example
//!
//! ```ignore
//! let admins = users.provide_scope(Some("admins"), None)?;
//! users.load(Some(json!({"role": "admin"})), Some("admins"))?.await?;
//! for user in admins.items()? { /* ... */ }
//! ```

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::collection::{Collection, Shared};
use crate::error::CollectionError;
use crate::record::{PrimaryKey, Properties, Record, RecordHandle};

struct ScopeState {
    params: Properties,
    primary_keys: Vec<PrimaryKey>,
}

struct ScopeInner {
    name: String,
    state: RwLock<ScopeState>,
}

/// A named view owned by one collection. Clones share the same scope.
pub struct Scope<R> {
    inner: Arc<ScopeInner>,
    collection: Weak<Shared<R>>,
}

impl<R> Clone for Scope<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            collection: Weak::clone(&self.collection),
        }
    }
}

impl<R: Record> Scope<R> {
    /// Create a scope bound to `collection` without registering it.
    /// Use `Collection::set_scope` to make it visible by name.
    pub fn new(collection: &Collection<R>, name: impl Into<String>, params: Properties) -> Self {
        Self::bound(collection.downgrade(), name.into(), params)
    }

    pub(crate) fn bound(collection: Weak<Shared<R>>, name: String, params: Properties) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name,
                state: RwLock::new(ScopeState {
                    params,
                    primary_keys: Vec::new(),
                }),
            }),
            collection,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn params(&self) -> Result<Properties, CollectionError> {
        Ok(self.read_state()?.params.clone())
    }

    /// Merge `params` into the parameter bag.
    pub fn set_params(&self, params: Properties) -> Result<(), CollectionError> {
        self.write_state()?.params.extend(params);
        Ok(())
    }

    pub fn replace_params(&self, params: Properties) -> Result<(), CollectionError> {
        self.write_state()?.params = params;
        Ok(())
    }

    pub fn primary_keys(&self) -> Result<Vec<PrimaryKey>, CollectionError> {
        Ok(self.read_state()?.primary_keys.clone())
    }

    pub fn set_primary_keys<I, K>(&self, keys: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        self.write_state()?.primary_keys = keys.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// Append keys that are not members yet, in order.
    pub fn add_primary_keys<I, K>(&self, keys: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        let mut state = self.write_state()?;
        for key in keys {
            let key = key.into();
            if !state.primary_keys.contains(&key) {
                state.primary_keys.push(key);
            }
        }
        Ok(())
    }

    pub fn remove_primary_keys<I, K>(&self, keys: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        let removed: Vec<PrimaryKey> = keys.into_iter().map(Into::into).collect();
        self.write_state()?
            .primary_keys
            .retain(|key| !removed.contains(key));
        Ok(())
    }

    /// The member records currently present in the collection, in member order.
    pub fn items(&self) -> Result<Vec<RecordHandle<R>>, CollectionError> {
        let keys = self.primary_keys()?;
        let Some(shared) = self.collection.upgrade() else {
            return Ok(Vec::new());
        };
        let state = shared.read_state()?;
        Ok(state.records.get_many(&keys))
    }

    /// Whether both values are handles to the same scope.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared<R>>) -> bool {
        std::ptr::eq(self.collection.as_ptr(), Arc::as_ptr(shared))
    }

    pub(crate) fn rekey(&self, old: &PrimaryKey, new: &PrimaryKey) -> Result<(), CollectionError> {
        if old == new {
            return Ok(());
        }
        let mut state = self.write_state()?;
        if state.primary_keys.contains(new) {
            state.primary_keys.retain(|key| key != old);
        } else {
            for key in state.primary_keys.iter_mut() {
                if key == old {
                    *key = new.clone();
                }
            }
        }
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, ScopeState>, CollectionError> {
        self.inner
            .state
            .read()
            .map_err(|_| CollectionError::LockPoisoned("scope read"))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, ScopeState>, CollectionError> {
        self.inner
            .state
            .write()
            .map_err(|_| CollectionError::LockPoisoned("scope write"))
    }
}

impl<R> fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("name", &self.inner.name).finish()
    }
}
