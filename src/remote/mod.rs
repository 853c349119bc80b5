// Linkshelf remote record access
// The record backend owns persistence, auth and full-text search. Everything
// in this crate reaches it through the `RecordStore` trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::collection::Collection;
use crate::types::errors::StoreError;

pub mod filter;
#[cfg(feature = "network")]
pub mod http;
pub mod memory;

/// Options for a full-list read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Filter expression; empty means unconstrained.
    pub filter: String,
    /// Relation fields to expand inline.
    pub expand: Vec<String>,
    /// Page size used while draining the list. `0` lets the store decide.
    pub batch: u32,
}

impl ListOptions {
    pub fn filtered(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Default::default()
        }
    }

    pub fn expand(mut self, relations: &[&str]) -> Self {
        self.expand = relations.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn batch(mut self, batch: u32) -> Self {
        self.batch = batch;
        self
    }
}

/// Generic record CRUD/query API of the backend.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads every record of a collection matching `options.filter`.
    async fn list(&self, collection: Collection, options: &ListOptions) -> Result<Vec<Value>, StoreError>;
    async fn get_one(&self, collection: Collection, id: &str, expand: &[String]) -> Result<Value, StoreError>;
    async fn create(&self, collection: Collection, fields: Value) -> Result<Value, StoreError>;
    async fn update(&self, collection: Collection, id: &str, fields: Value) -> Result<Value, StoreError>;
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
    /// Full-text search. Bypasses the filter grammar entirely.
    async fn search(&self, collection: Collection, text: &str) -> Result<Vec<Value>, StoreError>;
    /// Calls a custom backend endpoint with a JSON body.
    async fn send(&self, path: &str, body: Value) -> Result<Value, StoreError>;
}

/// Decodes a raw record into a typed struct.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(StoreError::from)
}

/// Decodes a list of raw records, failing on the first malformed one.
pub fn decode_all<T: DeserializeOwned>(values: &[Value]) -> Result<Vec<T>, StoreError> {
    values.iter().cloned().map(decode).collect()
}
