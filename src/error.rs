use std::fmt;

/// Error type for collection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A persistence call was made before any strategy was bound.
    MissingPersistenceStrategy { collection: &'static str },
    /// A property bag handed to `set` carries no primary key field.
    MissingPrimaryKey {
        collection: &'static str,
        field: &'static str,
    },
    /// The primary key field holds something other than a string or integer.
    InvalidPrimaryKey {
        collection: &'static str,
        value: String,
    },
    /// Converting between a record and its property bag failed.
    Serde(String),
    /// The collection or a record lock was poisoned.
    LockPoisoned(&'static str),
    /// A scope created by another collection was handed to `set_scope`.
    ForeignScope { name: String },
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::MissingPersistenceStrategy { collection } => write!(
                f,
                "no persistence strategy set for collection {}",
                collection
            ),
            CollectionError::MissingPrimaryKey { collection, field } => write!(
                f,
                "missing primary key field `{}` for collection {}",
                field, collection
            ),
            CollectionError::InvalidPrimaryKey { collection, value } => write!(
                f,
                "invalid primary key {} for collection {} (expected a string or an integer)",
                value, collection
            ),
            CollectionError::Serde(msg) => write!(f, "record serialization error: {}", msg),
            CollectionError::LockPoisoned(operation) => {
                write!(f, "collection lock poisoned during {}", operation)
            }
            CollectionError::ForeignScope { name } => {
                write!(f, "scope {} belongs to another collection", name)
            }
        }
    }
}

impl std::error::Error for CollectionError {}

impl From<serde_json::Error> for CollectionError {
    fn from(err: serde_json::Error) -> Self {
        CollectionError::Serde(err.to_string())
    }
}
