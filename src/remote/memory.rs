//! In-process `RecordStore`.
//!
//! Keeps records as JSON objects per collection, evaluates filter expressions
//! with `remote::filter` and expands relations the same way the backend does.
//! Used for offline runs and as the backing store in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::filter;
use super::{ListOptions, RecordStore};
use crate::types::collection::Collection;
use crate::types::errors::StoreError;

/// Length of generated record ids, matching the backend's 15-character ids.
const ID_LEN: usize = 15;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()[..ID_LEN].to_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Collection, Vec<Value>>> {
        // A poisoned map is still structurally valid JSON.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts records verbatim. Records without an `id` get one assigned.
    pub fn seed(&self, collection: Collection, records: Vec<Value>) {
        let mut map = self.lock();
        let list = map.entry(collection).or_default();
        for mut record in records {
            if let Value::Object(obj) = &mut record {
                obj.entry("id")
                    .or_insert_with(|| Value::String(Self::generate_id()));
            }
            list.push(record);
        }
    }

    /// Snapshot of a collection without expansion.
    pub fn records(&self, collection: Collection) -> Vec<Value> {
        self.lock().get(&collection).cloned().unwrap_or_default()
    }

    fn not_found(collection: Collection, id: &str) -> StoreError {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Adds an `expand` object holding the related records for each requested relation.
    fn expand(
        map: &HashMap<Collection, Vec<Value>>,
        collection: Collection,
        record: &Value,
        relations: &[String],
    ) -> Value {
        let mut record = record.clone();
        if relations.is_empty() {
            return record;
        }

        let mut expanded = Map::new();
        for relation in relations {
            let Some(target) = collection.relation_target(relation) else {
                continue;
            };
            let related = map.get(&target).map(Vec::as_slice).unwrap_or(&[]);
            let find = |id: &str| {
                related
                    .iter()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
                    .cloned()
            };

            match record.get(relation.as_str()) {
                Some(Value::String(id)) if !id.is_empty() => {
                    if let Some(found) = find(id.as_str()) {
                        expanded.insert(relation.clone(), found);
                    }
                }
                Some(Value::Array(ids)) => {
                    let found: Vec<Value> = ids
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(find)
                        .collect();
                    if !found.is_empty() {
                        expanded.insert(relation.clone(), Value::Array(found));
                    }
                }
                _ => {}
            }
        }

        if let Value::Object(obj) = &mut record {
            obj.insert("expand".to_string(), Value::Object(expanded));
        }
        record
    }

    fn matches_text(record: &Value, needle: &str) -> bool {
        match record {
            Value::Object(obj) => obj
                .iter()
                .filter(|(k, _)| k.as_str() != "id" && k.as_str() != "user")
                .any(|(_, v)| Self::matches_text(v, needle)),
            Value::String(s) => s.to_lowercase().contains(needle),
            _ => false,
        }
    }
}

fn fields_object(collection: Collection, fields: Value) -> Result<Map<String, Value>, StoreError> {
    match fields {
        Value::Object(obj) => Ok(obj),
        other => Err(StoreError::Status {
            status: 400,
            message: format!("expected an object for {}, got {}", collection, other),
        }),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, collection: Collection, options: &ListOptions) -> Result<Vec<Value>, StoreError> {
        let parsed = filter::parse(&options.filter)?;
        let map = self.lock();
        let records = map.get(&collection).map(Vec::as_slice).unwrap_or(&[]);
        Ok(records
            .iter()
            .filter(|r| parsed.matches(r))
            .map(|r| Self::expand(&map, collection, r, &options.expand))
            .collect())
    }

    async fn get_one(&self, collection: Collection, id: &str, expand: &[String]) -> Result<Value, StoreError> {
        let map = self.lock();
        map.get(&collection)
            .and_then(|list| {
                list.iter()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .map(|r| Self::expand(&map, collection, r, expand))
            .ok_or_else(|| Self::not_found(collection, id))
    }

    async fn create(&self, collection: Collection, fields: Value) -> Result<Value, StoreError> {
        let mut obj = fields_object(collection, fields)?;
        obj.insert("id".to_string(), Value::String(Self::generate_id()));
        let record = Value::Object(obj);
        self.lock().entry(collection).or_default().push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: Collection, id: &str, fields: Value) -> Result<Value, StoreError> {
        let patch = fields_object(collection, fields)?;
        let mut map = self.lock();
        let record = map
            .get_mut(&collection)
            .and_then(|list| {
                list.iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| Self::not_found(collection, id))?;

        if let Value::Object(obj) = &mut *record {
            for (key, value) in patch {
                if key != "id" {
                    obj.insert(key, value);
                }
            }
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut map = self.lock();
        let list = map.entry(collection).or_default();
        let before = list.len();
        list.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        if list.len() == before {
            return Err(Self::not_found(collection, id));
        }
        Ok(())
    }

    async fn search(&self, collection: Collection, text: &str) -> Result<Vec<Value>, StoreError> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let map = self.lock();
        Ok(map
            .get(&collection)
            .map(|list| {
                list.iter()
                    .filter(|r| Self::matches_text(r, &needle))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send(&self, path: &str, _body: Value) -> Result<Value, StoreError> {
        Err(StoreError::Unsupported(format!("custom endpoint {}", path)))
    }
}
