//! Key/value persistence for the task collection.
//!
//! [`KeyValueStore`] plays the role of browser local storage: a flat map of
//! string keys to string values. [`json_store`] maps the task collection and
//! the id counter onto two fixed keys of such a store.

mod file_store;
pub mod json_store;

pub use file_store::{JsonFileStore, store_path};

use crate::error::AppError;
use std::collections::HashMap;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

/// Volatile store, lost when dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}
