//! JSON file storage backend.
//!
//! [`JsonFileStorage`] keeps every item of a [`Storage`] in one JSON object
//! on disk. The file is read once on [`open`](JsonFileStorage::open); every
//! write rewrites it through a temporary sibling and a rename, so a crash
//! mid-write leaves the previous contents intact.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use phone_match_core::store::Storage;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub struct JsonFileStorage {
    path: PathBuf,
    items: RwLock<Map<String, Value>>,
}

impl JsonFileStorage {
    /// Open `path`, creating an empty store when the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file: {}", path.display()))?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content).with_context(|| {
                    format!("Storage file is not a JSON object: {}", path.display())
                })?
            }
        } else {
            Map::new()
        };
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    fn flush(&self, items: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let json = serde_json::to_string_pretty(items)?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn is_ready(&self) -> bool {
        true
    }

    fn get_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<()> {
        let mut items = self.items.write();
        items.insert(key.to_string(), value.clone());
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write();
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }
}
