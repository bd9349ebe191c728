//! Change notifications emitted by a collection.
//!
//! With the `emitter` feature, listeners registered through
//! `Collection::on_change` are called on emitter threads after the mutation
//! has been applied. Without it, emitting is a no-op.

/// A record was inserted or updated. Payload: its primary key.
pub const RECORD_SET: &str = "record_set";
/// A record was removed. Payload: its primary key.
pub const RECORD_UNSET: &str = "record_unset";
/// A record moved to a new key. Payload: the new primary key.
pub const RECORD_REKEYED: &str = "record_rekeyed";
/// All records were removed by `clear` or `reset`. Payload: the collection name.
pub const RECORDS_CLEARED: &str = "records_cleared";

#[cfg(feature = "emitter")]
mod emitter {
    use std::sync::Mutex;

    use event_emitter_rs::EventEmitter;

    use crate::error::CollectionError;

    pub(crate) struct ChangeEvents {
        emitter: Mutex<EventEmitter>,
    }

    impl ChangeEvents {
        pub(crate) fn new() -> Self {
            Self {
                emitter: Mutex::new(EventEmitter::new()),
            }
        }

        pub(crate) fn on<F>(&self, event: &str, listener: F) -> Result<String, CollectionError>
        where
            F: Fn(String) + Send + Sync + 'static,
        {
            let mut emitter = self
                .emitter
                .lock()
                .map_err(|_| CollectionError::LockPoisoned("change listener registration"))?;
            Ok(emitter.on(event, listener))
        }

        pub(crate) fn remove(&self, id: &str) -> Result<bool, CollectionError> {
            let mut emitter = self
                .emitter
                .lock()
                .map_err(|_| CollectionError::LockPoisoned("change listener removal"))?;
            Ok(emitter.remove_listener(id).is_some())
        }

        /// Fire-and-forget; a poisoned emitter drops the notification.
        pub(crate) fn emit(&self, event: &str, payload: String) {
            if let Ok(mut emitter) = self.emitter.lock() {
                emitter.emit(event, payload);
            }
        }
    }
}

#[cfg(not(feature = "emitter"))]
mod emitter {
    pub(crate) struct ChangeEvents;

    impl ChangeEvents {
        pub(crate) fn new() -> Self {
            ChangeEvents
        }

        pub(crate) fn emit(&self, _event: &str, _payload: String) {}
    }
}

pub(crate) use emitter::ChangeEvents;
