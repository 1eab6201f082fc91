//! Keyed cache store.
//!
//! Two mappings that always change together:
//!
//! | Mapping | Key | Value |
//! |---------|-----|-------|
//! | match record | encoded [`CacheKey`] | [`MatchRecordEntry`] |
//! | data map | query | entities from every source, tagged with `source` |
//!
//! Both are held behind `Arc`s. Operations that change nothing hand back the
//! same `Arc`s, so consumers can detect "unchanged" with [`Arc::ptr_eq`]
//! instead of comparing contents.
//!
//! # Data map ordering
//!
//! For a fixed query each source owns at most one contiguous run of
//! entities. Recording new results for a source removes its old run and
//! appends the new one after the other sources' entities.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions::MatcherAction;
use crate::models::{CacheKey, MatchRecordEntry, MatchResult, MatchedEntity, SearchResults};

/// Default freshness window for found entries: 30 minutes.
pub const DEFAULT_TTL_MS: i64 = 30 * 60 * 1000;

/// Default freshness window for not-found entries: 30 seconds.
pub const DEFAULT_NO_MATCH_TTL_MS: i64 = 30 * 1000;

pub type MatchRecord = BTreeMap<String, MatchRecordEntry>;
pub type DataMap = BTreeMap<String, Vec<MatchedEntity>>;

/// Freshness windows for positive and negative results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub ttl_ms: i64,
    pub no_match_ttl_ms: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            no_match_ttl_ms: DEFAULT_NO_MATCH_TTL_MS,
        }
    }
}

impl CachePolicy {
    pub fn ttl_for(&self, result: MatchResult) -> i64 {
        match result {
            MatchResult::Found => self.ttl_ms,
            MatchResult::NotFound => self.no_match_ttl_ms,
        }
    }

    /// An entry is expired once its age exceeds the window for its result.
    pub fn is_expired(&self, entry: &MatchRecordEntry, now: i64) -> bool {
        now - entry.timestamp > self.ttl_for(entry.result)
    }

    pub fn is_fresh(&self, entry: &MatchRecordEntry, now: i64) -> bool {
        !self.is_expired(entry, now)
    }
}

/// Encoded keys of every expired entry in `record`, in key order.
pub fn expired_keys(record: &MatchRecord, policy: &CachePolicy, now: i64) -> Vec<String> {
    record
        .iter()
        .filter(|(_, entry)| policy.is_expired(entry, now))
        .map(|(key, _)| key.clone())
        .collect()
}

/// The persisted cache: match record plus data map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheState {
    #[serde(default)]
    match_record: Arc<MatchRecord>,
    #[serde(default)]
    data_map: Arc<DataMap>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_record(&self) -> &Arc<MatchRecord> {
        &self.match_record
    }

    pub fn data_map(&self) -> &Arc<DataMap> {
        &self.data_map
    }

    pub fn entry(&self, source_name: &str, query: &str) -> Option<&MatchRecordEntry> {
        self.match_record
            .get(&CacheKey::new(source_name, query).encode())
    }

    /// True when both mappings are the very same allocations as `other`'s.
    pub fn ptr_eq(&self, other: &CacheState) -> bool {
        Arc::ptr_eq(&self.match_record, &other.match_record)
            && Arc::ptr_eq(&self.data_map, &other.data_map)
    }

    /// Record one source's answer for every query in `results`.
    ///
    /// Non-empty entity lists are `found`, empty ones `notFound`. The
    /// source's previous contribution to each query is replaced; other
    /// sources are untouched. The data map keeps its `Arc` when no query's
    /// entity list changes, e.g. for a result that found nothing.
    pub fn record_match_results(
        &self,
        source_name: &str,
        results: &SearchResults,
        timestamp: i64,
    ) -> CacheState {
        if results.is_empty() {
            return self.clone();
        }

        let mut match_record = Arc::clone(&self.match_record);
        let mut data_map = Arc::clone(&self.data_map);
        let record = Arc::make_mut(&mut match_record);

        for (query, entities) in results {
            record.insert(
                CacheKey::new(source_name, query.as_str()).encode(),
                MatchRecordEntry {
                    result: MatchResult::from_entities(entities),
                    timestamp,
                },
            );

            let current = self.data_map.get(query);
            let mut merged: Vec<MatchedEntity> = current
                .map(|list| {
                    list.iter()
                        .filter(|e| e.source != source_name)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            merged.extend(
                entities
                    .iter()
                    .cloned()
                    .map(|r| MatchedEntity::tag(source_name, r)),
            );

            // The data map is copied only once some query's list differs.
            let unchanged = match current {
                Some(list) => *list == merged,
                None => merged.is_empty(),
            };
            if unchanged {
                continue;
            }
            let data = Arc::make_mut(&mut data_map);
            if merged.is_empty() {
                data.remove(query);
            } else {
                data.insert(query.clone(), merged);
            }
        }

        CacheState {
            match_record,
            data_map,
        }
    }

    /// Remove every entry named in `expired_keys`.
    ///
    /// In the data map only the contribution of the source named by each key
    /// is dropped; a query whose list becomes empty disappears. Keys that do
    /// not parse are still removed from the match record. A mapping that
    /// loses nothing keeps its `Arc`.
    pub fn evict(&self, expired_keys: &[String]) -> CacheState {
        if expired_keys.is_empty() {
            return self.clone();
        }

        let mut match_record = Arc::clone(&self.match_record);
        let mut data_map = Arc::clone(&self.data_map);

        for encoded in expired_keys {
            if match_record.contains_key(encoded) {
                Arc::make_mut(&mut match_record).remove(encoded);
            }
            let Ok(key) = CacheKey::parse(encoded) else {
                continue;
            };
            let contributes = data_map
                .get(&key.query)
                .is_some_and(|list| list.iter().any(|e| e.source == key.source_name));
            if !contributes {
                continue;
            }
            let data = Arc::make_mut(&mut data_map);
            if let Some(entities) = data.get_mut(&key.query) {
                entities.retain(|e| e.source != key.source_name);
                if entities.is_empty() {
                    data.remove(&key.query);
                }
            }
        }

        CacheState {
            match_record,
            data_map,
        }
    }

    pub fn reduce(&self, action: &MatcherAction) -> CacheState {
        match action {
            MatcherAction::InitSuccess { expired_keys } => self.evict(expired_keys),
            MatcherAction::MatchSuccess {
                source_name,
                queries,
                results,
                timestamp,
            } => {
                let answered: SearchResults = queries
                    .iter()
                    .map(|q| (q.clone(), results.get(q).cloned().unwrap_or_default()))
                    .collect();
                self.record_match_results(source_name, &answered, *timestamp)
            }
            _ => self.clone(),
        }
    }
}
