//! Core data models shared by the matcher engine and its storage.
//!
//! A match is always addressed by a [`CacheKey`]: the pair of the search
//! source that answered and the raw query (a phone number, a session id).
//! Search sources return plain JSON records; the engine tags each record
//! with its originating source before publishing it as a [`MatchedEntity`].

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single entity record returned by a search source.
pub type Record = Map<String, Value>;

/// Search output: query → entities found for that query.
pub type SearchResults = HashMap<String, Vec<Record>>;

/// Composite `(source_name, query)` address of a match.
///
/// The textual form produced by [`CacheKey::encode`] is a JSON two-element
/// array, which is stable, unique and lossless for any pair of strings.
///
/// ```rust
/// use phone_match_core::models::CacheKey;
///
/// let key = CacheKey::new("contacts", "+1 (555) 010");
/// assert_eq!(key.encode(), r#"["contacts","+1 (555) 010"]"#);
/// assert_eq!(CacheKey::parse(&key.encode()).unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub source_name: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(source_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            query: query.into(),
        }
    }

    /// Encode as a JSON array string, usable as a map key.
    pub fn encode(&self) -> String {
        Value::Array(vec![
            Value::String(self.source_name.clone()),
            Value::String(self.query.clone()),
        ])
        .to_string()
    }

    /// Decode a key produced by [`encode`](CacheKey::encode).
    pub fn parse(encoded: &str) -> Result<Self> {
        let (source_name, query): (String, String) = serde_json::from_str(encoded)
            .with_context(|| format!("Invalid cache key: {}", encoded))?;
        Ok(Self { source_name, query })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Encode `(source_name, query)` without building a [`CacheKey`] first.
pub fn get_cache_key(source_name: &str, query: &str) -> String {
    CacheKey::new(source_name, query).encode()
}

/// Inverse of [`get_cache_key`].
pub fn parse_cache_key(encoded: &str) -> Result<(String, String)> {
    let key = CacheKey::parse(encoded)?;
    Ok((key.source_name, key.query))
}

/// Outcome of the most recent search for a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchResult {
    Found,
    NotFound,
}

impl MatchResult {
    pub fn from_entities(entities: &[Record]) -> Self {
        if entities.is_empty() {
            MatchResult::NotFound
        } else {
            MatchResult::Found
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Found => f.pad("found"),
            MatchResult::NotFound => f.pad("notFound"),
        }
    }
}

/// One entry per cache key: result plus the wall-clock time (ms) of the
/// search that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecordEntry {
    pub result: MatchResult,
    pub timestamp: i64,
}

/// An entity published in the data map, tagged with the source that found it.
///
/// Serializes flat: `{"source": "contacts", "id": 1, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntity {
    pub source: String,
    #[serde(flatten)]
    pub record: Record,
}

impl MatchedEntity {
    /// Tag a record with its source. A `source` field already present in the
    /// record is replaced.
    pub fn tag(source: &str, mut record: Record) -> Self {
        record.remove("source");
        Self {
            source: source.to_string(),
            record,
        }
    }

    /// Flattened JSON form, as consumers see it.
    pub fn to_value(&self) -> Value {
        let mut map = self.record.clone();
        map.insert("source".to_string(), Value::String(self.source.clone()));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_roundtrip() {
        let pairs = [
            ("contacts", "555"),
            ("", ""),
            ("a\",\"b", "c]"),
            ("company directory", "+1 (650) 555-0100"),
            ("ünïcode", "☎"),
        ];
        for (source, query) in pairs {
            let encoded = get_cache_key(source, query);
            let (s, q) = parse_cache_key(&encoded).unwrap();
            assert_eq!(s, source);
            assert_eq!(q, query);
        }
    }

    #[test]
    fn test_cache_key_encoding_is_unique() {
        assert_ne!(get_cache_key("ab", "c"), get_cache_key("a", "bc"));
        assert_ne!(get_cache_key("a,b", "c"), get_cache_key("a", "b,c"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CacheKey::parse("not json").is_err());
        assert!(CacheKey::parse(r#"["only-one"]"#).is_err());
        assert!(CacheKey::parse(r#"["a","b","c"]"#).is_err());
    }

    #[test]
    fn test_tag_overrides_source_field() {
        let record = json!({"id": 1, "source": "spoofed"})
            .as_object()
            .cloned()
            .unwrap();
        let entity = MatchedEntity::tag("contacts", record);
        assert_eq!(entity.source, "contacts");
        assert_eq!(entity.to_value(), json!({"id": 1, "source": "contacts"}));
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"id": 1, "source": "contacts"})
        );
    }

    #[test]
    fn test_match_result_serializes_camel_case() {
        assert_eq!(
            serde_json::to_value(MatchResult::NotFound).unwrap(),
            json!("notFound")
        );
        assert_eq!(MatchResult::from_entities(&[]), MatchResult::NotFound);
    }
}
