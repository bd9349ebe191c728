mod collection;
mod error;
pub mod events;
mod persistence;
mod record;
mod scope;

pub use collection::{Collection, CollectionHandle};
pub use error::CollectionError;
pub use persistence::{
    InMemoryPersistence, PersistenceError, PersistenceFuture, PersistenceStrategy, RecordOrKey,
};
pub use record::{PrimaryKey, Properties, Record, RecordHandle};
pub use scope::Scope;

// Re-export the derive macro alongside the trait it implements
#[cfg(feature = "derive")]
pub use record_collection_macros::Record;

// Re-exported so strategy implementors use the same macro version
pub use async_trait::async_trait;
