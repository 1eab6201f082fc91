//! Durable storage abstraction for matcher caches.
//!
//! The [`Storage`] trait is the minimal key-value surface a matcher needs to
//! survive restarts: a readiness flag plus get/set of JSON values. Backends
//! decide where the bytes go (memory, a JSON file, browser storage behind a
//! binding).
//!
//! Calls are synchronous. A matcher writes its whole cache under one key
//! after every change, and it does so while holding its state lock, which
//! keeps the stored value in step with the in-memory state.
//!
//! Implementations must be `Send + Sync`.

pub mod memory;

use anyhow::Result;
use serde_json::Value;

/// Abstract durable key-value storage.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`is_ready`](Storage::is_ready) | Whether the backend has loaded and accepts reads |
/// | [`get_item`](Storage::get_item) | Read a value by key |
/// | [`set_item`](Storage::set_item) | Insert or replace a value |
/// | [`remove_item`](Storage::remove_item) | Delete a value |
pub trait Storage: Send + Sync {
    fn is_ready(&self) -> bool;

    fn get_item(&self, key: &str) -> Result<Option<Value>>;

    fn set_item(&self, key: &str, value: &Value) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}
