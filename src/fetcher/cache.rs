//! Run-scoped response cache
//!
//! Maps request keys to decoded response bodies for the lifetime of the
//! process. Shared by the coordinating path and every worker; clones are
//! handles onto the same map.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Concurrent request-key → response map
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, Value>>,
}

impl ResponseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously stored response
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Whether `key` has a stored response
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a successful response.
    ///
    /// `null` and empty arrays/objects are not stored, and the first value
    /// written for a key is kept. Returns `true` if the value was inserted.
    pub fn put(&self, key: &str, value: &Value) -> bool {
        if is_empty_response(value) {
            return false;
        }
        let mut inserted = false;
        self.entries.entry(key.to_string()).or_insert_with(|| {
            inserted = true;
            value.clone()
        });
        if inserted {
            debug!(key, "cached response");
        }
        inserted
    }

    /// Number of cached responses
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}
