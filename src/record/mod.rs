//! Records - the entities a collection stores.
//!
//! A record is any serde-serializable struct with a primary key. Its fields
//! double as the property bag used to build and update it.
//!
//! ## Example
//!
//! ```ignore
//! use record_collection::Record;
//!
//! #[derive(Serialize, Deserialize, Clone, Record)]
//! #[record(collection = "users")]
//! struct User {
//!     pub id: i64,
//!     pub name: String,
//! }
//! ```

mod handle;
mod primary_key;


use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::CollectionError;

pub use handle::RecordHandle;
pub use primary_key::PrimaryKey;

/// Open property bag a record is built from and updated with.
pub type Properties = Map<String, Value>;

/// Trait for types that can be stored in a collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The collection name for this record type (e.g. "users").
    const COLLECTION: &'static str;

    /// The property holding the primary key.
    const PRIMARY_KEY: &'static str = "id";

    /// Returns the primary key of this record.
    fn primary_key(&self) -> PrimaryKey;

    /// Build a record from a property bag.
    fn from_properties(properties: Properties) -> Result<Self, CollectionError> {
        Ok(serde_json::from_value(Value::Object(properties))?)
    }

    /// The record's current properties.
    fn properties(&self) -> Result<Properties, CollectionError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CollectionError::Serde(format!(
                "{} record serialized to {} instead of an object",
                Self::COLLECTION,
                other
            ))),
        }
    }

    /// Overwrite the properties present in `properties`, keeping the rest.
    ///
    /// The default rebuilds the record from its serialized form merged with
    /// `properties`. Fields that do not serialize (`#[serde(skip)]`) come back
    /// as their default on every in-place `Collection::set`; override this
    /// method to carry such fields over.
    fn update_properties(&mut self, properties: Properties) -> Result<(), CollectionError> {
        let mut merged = self.properties()?;
        merged.extend(properties);
        *self = Self::from_properties(merged)?;
        Ok(())
    }
}

/// Read the primary key out of a property bag for record type `R`.
pub(crate) fn primary_key_of<R: Record>(
    properties: &Properties,
) -> Result<PrimaryKey, CollectionError> {
    let value = properties
        .get(R::PRIMARY_KEY)
        .filter(|value| !value.is_null())
        .ok_or(CollectionError::MissingPrimaryKey {
            collection: R::COLLECTION,
            field: R::PRIMARY_KEY,
        })?;

    PrimaryKey::from_value(value).ok_or_else(|| CollectionError::InvalidPrimaryKey {
        collection: R::COLLECTION,
        value: value.to_string(),
    })
}
