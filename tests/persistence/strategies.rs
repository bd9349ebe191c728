//! Hand-written strategies used to observe delegation.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use record_collection::{
    async_trait, CollectionHandle, PersistenceError, PersistenceStrategy, PrimaryKey, Record,
    RecordHandle, RecordOrKey,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::models::{props, Contact};

/// One call received by a strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub key: Option<PrimaryKey>,
    pub params: Option<Value>,
    pub scope: Option<String>,
}

/// Records every call and, for `load_one`, waits for `release` before
/// writing the record into the collection.
#[derive(Default)]
pub struct GatedStrategy {
    pub calls: Mutex<Vec<Call>>,
    pub gate: Notify,
}

impl GatedStrategy {
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        method: &'static str,
        key: Option<PrimaryKey>,
        params: Option<Value>,
        scope: Option<&str>,
    ) {
        self.calls.lock().unwrap().push(Call {
            method,
            key,
            params,
            scope: scope.map(str::to_owned),
        });
    }
}

#[async_trait]
impl PersistenceStrategy<Contact> for GatedStrategy {
    async fn load(
        &self,
        collection: &CollectionHandle<Contact>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        self.record("load", None, params, scope_name);
        collection.set_many(vec![
            props(json!({"id": 1, "name": "Ada", "email": "ada@example.com"})),
            props(json!({"id": 2, "name": "Grace", "email": "grace@example.com"})),
        ])?;
        Ok(json!({"loaded": 2}))
    }

    async fn load_one(
        &self,
        collection: &CollectionHandle<Contact>,
        target: RecordOrKey<Contact>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let key = target.primary_key()?;
        self.record("load_one", Some(key.clone()), params, scope_name);

        self.gate.notified().await;

        collection.set(props(json!({
            "id": key.to_value(),
            "name": "Loaded",
            "email": "loaded@example.com"
        })))?;
        if let Some(name) = scope_name {
            collection
                .provide_scope(Some(name), None)?
                .add_primary_keys([key])?;
        }
        Ok(json!("loaded"))
    }

    async fn save_one(
        &self,
        _collection: &CollectionHandle<Contact>,
        record: RecordHandle<Contact>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        self.record("save_one", Some(record.primary_key()?), params, scope_name);
        Ok(json!("saved"))
    }

    async fn destroy_one(
        &self,
        collection: &CollectionHandle<Contact>,
        record: RecordHandle<Contact>,
        params: Option<Value>,
        scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let key = record.primary_key()?;
        self.record("destroy_one", Some(key.clone()), params, scope_name);
        collection.unset(key)?;
        Ok(Value::Null)
    }
}

/// Rejects everything without touching the collection.
pub struct RejectingStrategy;

#[async_trait]
impl PersistenceStrategy<Contact> for RejectingStrategy {
    async fn load(
        &self,
        _collection: &CollectionHandle<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        Err(PersistenceError::Transport("connection refused".into()))
    }

    async fn load_one(
        &self,
        _collection: &CollectionHandle<Contact>,
        _target: RecordOrKey<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        Err(PersistenceError::Transport("connection refused".into()))
    }

    async fn save_one(
        &self,
        _collection: &CollectionHandle<Contact>,
        _record: RecordHandle<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        Err(PersistenceError::Rejected("quota exceeded".into()))
    }

    async fn destroy_one(
        &self,
        _collection: &CollectionHandle<Contact>,
        _record: RecordHandle<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        Err(PersistenceError::Rejected("read only".into()))
    }
}

/// Gives records saved with a negative (local) id a server id and re-keys
/// them in the collection.
pub struct AssigningStrategy {
    next_id: AtomicI64,
}

impl AssigningStrategy {
    pub fn starting_at(first: i64) -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(first),
        })
    }
}

#[async_trait]
impl PersistenceStrategy<Contact> for AssigningStrategy {
    async fn load(
        &self,
        _collection: &CollectionHandle<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        Ok(json!([]))
    }

    async fn load_one(
        &self,
        _collection: &CollectionHandle<Contact>,
        target: RecordOrKey<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        Err(PersistenceError::NotFound {
            collection: Contact::COLLECTION.into(),
            key: target.primary_key()?.to_string(),
        })
    }

    async fn save_one(
        &self,
        collection: &CollectionHandle<Contact>,
        record: RecordHandle<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        let local_id = record.read()?.id;
        if local_id >= 0 {
            return Ok(json!(local_id));
        }

        let server_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        record.write()?.id = server_id;
        collection.update_record_primary_key(local_id, server_id)?;
        Ok(json!(server_id))
    }

    async fn destroy_one(
        &self,
        collection: &CollectionHandle<Contact>,
        record: RecordHandle<Contact>,
        _params: Option<Value>,
        _scope_name: Option<&str>,
    ) -> Result<Value, PersistenceError> {
        collection.unset(record.primary_key()?)?;
        Ok(Value::Null)
    }
}
