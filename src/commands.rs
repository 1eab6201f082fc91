//! Implementations of the `pmatch` subcommands.
//!
//! Every command builds a [`ContactMatcher`] from the loaded [`Config`]:
//! one [`DirectorySearchSource`] per `[directories.<name>]` section and a
//! [`JsonFileStorage`] when `[storage]` is set. The CLI session is always
//! logged in.

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use phone_match_core::models::{CacheKey, MatchedEntity};
use phone_match_core::store::Storage;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::contact_matcher::ContactMatcher;
use crate::directory::DirectorySearchSource;
use crate::file_store::JsonFileStorage;
use crate::traits::SessionFlag;

fn open_storage(config: &Config) -> Result<Option<Arc<dyn Storage>>> {
    match &config.storage {
        Some(storage) => {
            let store: Arc<dyn Storage> = Arc::new(JsonFileStorage::open(&storage.path)?);
            Ok(Some(store))
        }
        None => Ok(None),
    }
}

/// Build and initialize a matcher with every configured directory.
pub async fn build_matcher(config: &Config) -> Result<ContactMatcher> {
    let storage = open_storage(config)?;
    let matcher = ContactMatcher::new(
        &config.matcher,
        Arc::new(SessionFlag::new(true)),
        storage,
    );
    for (name, dir) in &config.directories {
        let source = DirectorySearchSource::load(name.as_str(), &dir.path)?;
        matcher
            .add_search_source(Arc::new(source))
            .with_context(|| format!("Failed to register directory '{}'", name))?;
    }
    matcher.on_state_change().await;
    if !matcher.ready() {
        bail!("matcher '{}' did not become ready", matcher.name());
    }
    Ok(matcher)
}

pub fn list_sources(config: &Config) -> Result<()> {
    if config.directories.is_empty() {
        println!("No directories configured.");
        return Ok(());
    }

    println!("{:<16} {:<10} PATH", "SOURCE", "CONTACTS");
    for (name, dir) in &config.directories {
        let contacts = match DirectorySearchSource::load(name.as_str(), &dir.path) {
            Ok(source) => source.contacts().len().to_string(),
            Err(_) => "ERROR".to_string(),
        };
        println!("{:<16} {:<10} {}", name, contacts, dir.path.display());
    }
    Ok(())
}

fn entity_label(entity: &MatchedEntity) -> String {
    let name = entity
        .record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("?");
    let id = entity.record.get("id").map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    match id {
        Some(id) => format!("{} ({}) [{}]", name, id, entity.source),
        None => format!("{} [{}]", name, entity.source),
    }
}

pub async fn run_match(config: &Config, numbers: &[String], force: bool) -> Result<()> {
    if numbers.is_empty() {
        bail!("at least one number is required");
    }
    let matcher = build_matcher(config).await?;
    if force {
        matcher.force_match_batch_numbers(numbers).await;
    } else {
        matcher.match_queries(numbers, false).await;
    }

    let data = matcher.data_mapping();
    for number in numbers {
        match data.get(number.as_str()) {
            Some(entities) if !entities.is_empty() => {
                println!("{}:", number);
                for entity in entities {
                    println!("  {}", entity_label(entity));
                }
            }
            _ => println!("{}: no match", number),
        }
    }
    Ok(())
}

fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

pub async fn show_cache(config: &Config, as_json: bool) -> Result<()> {
    let matcher = build_matcher(config).await?;
    let cache = matcher.cache();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&cache)?);
        return Ok(());
    }

    if cache.match_record().is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }
    println!("{:<16} {:<20} {:<10} RECORDED", "SOURCE", "QUERY", "RESULT");
    for (key, entry) in cache.match_record().iter() {
        let key = CacheKey::parse(key)?;
        println!(
            "{:<16} {:<20} {:<10} {}",
            key.source_name,
            key.query,
            entry.result,
            format_ts(entry.timestamp)
        );
    }
    Ok(())
}

pub fn purge_cache(config: &Config) -> Result<()> {
    let Some(storage) = open_storage(config)? else {
        bail!("no [storage] section configured; nothing to purge");
    };
    let key = config.matcher.storage_key();
    storage.remove_item(&key)?;
    println!("{}", json!({ "purged": key }));
    Ok(())
}
