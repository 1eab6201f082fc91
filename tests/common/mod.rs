//! Shared test search source.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use phone_match::traits::SearchSource;
use phone_match_core::models::{Record, SearchResults};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

pub fn q(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A search source that answers from a fixed table and records every call.
///
/// Queries missing from the table are left out of the response entirely.
/// With a gate, each search waits for one permit before answering.
pub struct RecordingSource {
    name: String,
    answers: HashMap<String, Vec<Record>>,
    calls: Mutex<Vec<Vec<String>>>,
    gate: Option<Arc<Semaphore>>,
    fail: AtomicBool,
    ready: AtomicBool,
}

impl RecordingSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            answers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            gate: None,
            fail: AtomicBool::new(false),
            ready: AtomicBool::new(true),
        }
    }

    pub fn answer(mut self, query: &str, value: Value) -> Self {
        self.answers
            .entry(query.to_string())
            .or_default()
            .push(record(value));
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SearchSource for RecordingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn search(&self, queries: &[String]) -> Result<SearchResults> {
        self.calls.lock().push(queries.to_vec());
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("backend unavailable");
        }
        let mut results = SearchResults::new();
        for query in queries {
            if let Some(records) = self.answers.get(query) {
                results.insert(query.clone(), records.clone());
            }
        }
        Ok(results)
    }
}
