//! TOML configuration.
//!
//! ```toml
//! [matcher]
//! name = "contactMatcher"
//! ttl_ms = 1800000
//! no_match_ttl_ms = 30000
//! search_timeout_ms = 5000
//!
//! [storage]
//! path = "./data/match-cache.json"
//!
//! [directories.company]
//! path = "./config/company.toml"
//! ```
//!
//! Every section is optional. See [`load_config`] for validation rules.

use anyhow::{Context, Result};
use phone_match_core::cache::{CachePolicy, DEFAULT_NO_MATCH_TTL_MS, DEFAULT_TTL_MS};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub directories: BTreeMap<String, DirectoryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatcherConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: i64,
    #[serde(default = "default_no_match_ttl_ms")]
    pub no_match_ttl_ms: i64,
    /// No timeout when absent: a hung search keeps its queries in flight.
    #[serde(default)]
    pub search_timeout_ms: Option<u64>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            ttl_ms: DEFAULT_TTL_MS,
            no_match_ttl_ms: DEFAULT_NO_MATCH_TTL_MS,
            search_timeout_ms: None,
        }
    }
}

fn default_name() -> String {
    "contactMatcher".to_string()
}
fn default_ttl_ms() -> i64 {
    DEFAULT_TTL_MS
}
fn default_no_match_ttl_ms() -> i64 {
    DEFAULT_NO_MATCH_TTL_MS
}

impl MatcherConfig {
    /// Config with a different name and defaults everywhere else.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl_ms: self.ttl_ms,
            no_match_ttl_ms: self.no_match_ttl_ms,
        }
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_ms.map(Duration::from_millis)
    }

    /// Key under which this matcher's cache is persisted.
    pub fn storage_key(&self) -> String {
        cache_storage_key(&self.name)
    }
}

/// Storage key for the cache of the matcher called `name`.
pub fn cache_storage_key(name: &str) -> String {
    format!("{}-cache", name)
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    pub path: PathBuf,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.matcher.name.trim().is_empty() {
        anyhow::bail!("matcher.name must not be empty");
    }
    if config.matcher.ttl_ms < 0 {
        anyhow::bail!("matcher.ttl_ms must be >= 0");
    }
    if config.matcher.no_match_ttl_ms < 0 {
        anyhow::bail!("matcher.no_match_ttl_ms must be >= 0");
    }
    if config.matcher.search_timeout_ms == Some(0) {
        anyhow::bail!("matcher.search_timeout_ms must be > 0 when set");
    }
    if let Some(storage) = &config.storage {
        if storage.path.as_os_str().is_empty() {
            anyhow::bail!("storage.path must not be empty");
        }
    }
    for (name, dir) in &config.directories {
        if dir.path.as_os_str().is_empty() {
            anyhow::bail!("directories.{}.path must not be empty", name);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.matcher.name, "contactMatcher");
        assert_eq!(config.matcher.cache_policy(), CachePolicy::default());
        assert!(config.matcher.search_timeout().is_none());
        assert!(config.storage.is_none());
        assert!(config.directories.is_empty());
        assert_eq!(config.matcher.storage_key(), "contactMatcher-cache");
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
[matcher]
name = "activityMatcher"
ttl_ms = 60000
no_match_ttl_ms = 1000
search_timeout_ms = 250

[storage]
path = "/tmp/cache.json"

[directories.company]
path = "company.toml"
"#,
        )
        .unwrap();
        assert_eq!(config.matcher.name, "activityMatcher");
        assert_eq!(config.matcher.cache_policy().no_match_ttl_ms, 1000);
        assert_eq!(
            config.matcher.search_timeout(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            config.storage.unwrap().path,
            PathBuf::from("/tmp/cache.json")
        );
        assert_eq!(
            config.directories["company"].path,
            PathBuf::from("company.toml")
        );
    }

    #[test]
    fn test_validation() {
        assert!(parse_config("[matcher]\nname = \" \"").is_err());
        assert!(parse_config("[matcher]\nttl_ms = -1").is_err());
        assert!(parse_config("[matcher]\nno_match_ttl_ms = -5").is_err());
        assert!(parse_config("[matcher]\nsearch_timeout_ms = 0").is_err());
        assert!(parse_config("[directories.x]\npath = \"\"").is_err());
    }
}
