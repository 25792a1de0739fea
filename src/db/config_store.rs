//! In-memory config map persisted to the `config` table.
//!
//! The map is authoritative while the process runs. The table is read once at
//! startup and written back at shutdown.

use crate::error::DbError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Longest key the `config.key CHAR(32)` column is meant to hold.
pub const MAX_KEY_LEN: usize = 32;

/// Key under which the schema version is recorded.
pub const VERSION_KEY: &str = "version";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    entries: BTreeMap<String, Value>,
    /// Keys removed since the last flush; their stored rows must be deleted.
    removed: BTreeSet<String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The config a freshly bootstrapped database starts with.
    pub fn defaults(version: u32) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(VERSION_KEY.to_string(), Value::from(version));
        ConfigStore {
            entries,
            removed: BTreeSet::new(),
        }
    }

    pub fn reset_to_defaults(&mut self, version: u32) {
        *self = Self::defaults(version);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a value decoded as `T`; `None` if missing or of the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value, returning the previous one.
    ///
    /// # Errors
    /// Returns `InvalidConfigKey` if the key is empty or longer than 32 chars.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>, DbError> {
        let key = key.into();
        if key.is_empty() || key.chars().count() > MAX_KEY_LEN {
            return Err(DbError::InvalidConfigKey(key));
        }
        self.removed.remove(&key);
        Ok(self.entries.insert(key, value))
    }

    /// Remove a value. The stored row is deleted on the next flush.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let previous = self.entries.remove(key);
        if previous.is_some() {
            self.removed.insert(key.to_string());
        }
        previous
    }

    /// Keys removed since the last flush.
    pub fn removed(&self) -> impl Iterator<Item = &String> {
        self.removed.iter()
    }

    pub(crate) fn clear_removed(&mut self) {
        self.removed.clear();
    }

    /// Insert a value stored as serialized JSON text.
    pub(crate) fn insert_raw(&mut self, key: String, raw: &str) -> Result<(), DbError> {
        let value = serde_json::from_str(raw).map_err(|source| DbError::CorruptConfig {
            key: key.clone(),
            source,
        })?;
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
