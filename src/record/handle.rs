use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{PrimaryKey, Properties, Record};
use crate::error::CollectionError;

/// Shared handle to one record instance held by a collection.
///
/// Every handle for the same key points at the same instance, so an in-place
/// update through `Collection::set` is visible to all holders. Clone-friendly
/// via Arc.
pub struct RecordHandle<R> {
    inner: Arc<RwLock<R>>,
}

impl<R> Clone for RecordHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> RecordHandle<R> {
    pub fn new(record: R) -> Self {
        Self {
            inner: Arc::new(RwLock::new(record)),
        }
    }

    /// Borrow the record for reading.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, R>, CollectionError> {
        self.inner
            .read()
            .map_err(|_| CollectionError::LockPoisoned("record read"))
    }

    /// Borrow the record for writing.
    ///
    /// Changing the primary key field this way does not move the record inside
    /// its collection; follow up with `update_record_primary_key`.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, R>, CollectionError> {
        self.inner
            .write()
            .map_err(|_| CollectionError::LockPoisoned("record write"))
    }

    pub fn primary_key(&self) -> Result<PrimaryKey, CollectionError> {
        Ok(self.read()?.primary_key())
    }

    pub fn properties(&self) -> Result<Properties, CollectionError> {
        self.read()?.properties()
    }

    /// Copy the current state of the record out of the handle.
    pub fn snapshot(&self) -> Result<R, CollectionError>
    where
        R: Clone,
    {
        Ok(self.read()?.clone())
    }

    /// Whether both handles point at the same instance.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<R: Record> From<R> for RecordHandle<R> {
    fn from(record: R) -> Self {
        Self::new(record)
    }
}

impl<R: fmt::Debug> fmt::Debug for RecordHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.read() {
            Ok(record) => f.debug_tuple("RecordHandle").field(&*record).finish(),
            Err(_) => f.write_str("RecordHandle(<poisoned>)"),
        }
    }
}
