//! Record types used by the collection tests.

use record_collection::{Properties, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyed by slug rather than `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Record)]
#[record(collection = "articles")]
pub struct Article {
    #[record(primary_key)]
    pub slug: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Uses the default `id` key and the default collection name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Record)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub done: bool,
}

pub fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}
