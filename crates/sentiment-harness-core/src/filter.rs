//! Recursive key stripping for logged payloads.
//!
//! Request descriptors and responses are converted to [`serde_json::Value`]
//! before they reach the query log, so sensitive fields can be removed at
//! any depth. Dispatch is on the value's variant: objects drop matching
//! keys and recurse into the survivors, arrays recurse into every element,
//! and scalars pass through untouched.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// A case-insensitive set of keys to remove.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    keys: HashSet<String>,
}

impl KeyFilter {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|k| k.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn matches(&self, key: &str) -> bool {
        self.keys.contains(&key.to_ascii_lowercase())
    }

    /// Return a copy of `value` with every matching object key removed.
    pub fn strip(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let kept: Map<String, Value> = map
                    .iter()
                    .filter(|(k, _)| !self.matches(k))
                    .map(|(k, v)| (k.clone(), self.strip(v)))
                    .collect();
                Value::Object(kept)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.strip(v)).collect()),
            scalar => scalar.clone(),
        }
    }
}
