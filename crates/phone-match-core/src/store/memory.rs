//! In-memory [`Storage`] implementation for tests and embedding.
//!
//! Values live in a `HashMap` behind a `parking_lot::RwLock`. The ready flag
//! can be flipped at runtime to simulate a backend going away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;

use super::Storage;

pub struct InMemoryStorage {
    items: RwLock<HashMap<String, Value>>,
    ready: AtomicBool,
}

impl InMemoryStorage {
    /// A ready, empty store.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            ready: AtomicBool::new(true),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for InMemoryStorage {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn get_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<()> {
        self.items.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
