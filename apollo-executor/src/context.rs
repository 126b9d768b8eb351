//! Provide a [`Context`] for resolvers.
//!
//! The [`Executor`](crate::Executor) owns a [`Context`] and hands a clone of it to every
//! resolver call, so that state written by one execution (a mutation, typically) is seen by
//! the following ones.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;

use crate::json_ext::Value;

/// Holds [`Context`] entries.
pub(crate) type Entries = Arc<DashMap<String, Value>>;

/// Application state shared by the resolvers of an [`Executor`](crate::Executor).
///
/// Clones share the same entries. Each entry is locked for the duration of a single
/// `get`/`insert`/`upsert`; nothing serializes concurrent executions writing the same keys,
/// callers needing that must serialize their executions.
#[derive(Clone, Debug, Default)]
pub struct Context {
    entries: Entries,
}

impl Context {
    pub fn new() -> Self {
        Context {
            entries: Default::default(),
        }
    }

    /// Get a value from the context using the provided key.
    ///
    /// Semantics:
    ///  - If the operation fails, then the key is not present.
    ///  - If the operation succeeds, the value is an [`Option`].
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: for<'de> Deserialize<'de>,
    {
        self.entries
            .get(&key.into())
            .map(|v| serde_json_bytes::from_value(v.value().clone()))
            .transpose()
            .map_err(|e| e.into())
    }

    /// Insert a value int the context using the provided key and value.
    ///
    /// Semantics:
    ///  - If the operation fails, then the pair has not been inserted.
    ///  - If the operation succeeds, the result is the old value as an [`Option`].
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: for<'de> Deserialize<'de> + Serialize,
    {
        match serde_json_bytes::to_value(value) {
            Ok(value) => self
                .entries
                .insert(key.into(), value)
                .map(|v| serde_json_bytes::from_value(v))
                .transpose()
                .map_err(|e| e.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a value in the context using the provided key and update function.
    ///
    /// The update function is called with the current value, or `default()` if the key is not
    /// present, and its result is stored. The entry stays locked while the function runs.
    pub fn upsert<K, V>(
        &self,
        key: K,
        upsert: impl FnOnce(V) -> V,
        default: impl FnOnce() -> V,
    ) -> Result<(), BoxError>
    where
        K: Into<String>,
        V: for<'de> Deserialize<'de> + Serialize,
    {
        let mut entry = self.entries.entry(key.into()).or_insert(Value::Null);
        let current = match entry.value() {
            Value::Null => default(),
            value => serde_json_bytes::from_value(value.clone())?,
        };
        *entry.value_mut() = serde_json_bytes::to_value(upsert(current))?;
        Ok(())
    }

    pub fn contains_key<K>(&self, key: K) -> bool
    where
        K: Into<String>,
    {
        self.entries.contains_key(&key.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
