//! Contact directory search source.
//!
//! A directory is a TOML file listing contacts:
//!
//! ```toml
//! [[contacts]]
//! id = "c-1"
//! name = "Ada Lovelace"
//! phone_numbers = ["+1 (555) 010-2030"]
//! extension = "204"
//! ```
//!
//! Queries match when their digits equal the digits of one of a contact's
//! phone numbers, or equal its extension. Formatting (`+`, spaces, dashes,
//! parentheses) is ignored on both sides.

use anyhow::{Context, Result};
use async_trait::async_trait;
use phone_match_core::models::{Record, SearchResults};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::traits::SearchSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "phone_numbers")]
    pub phone_numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    contacts: Vec<Contact>,
}

/// Keep only ASCII digits.
pub fn normalize_number(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub struct DirectorySearchSource {
    name: String,
    contacts: Vec<Contact>,
}

impl DirectorySearchSource {
    pub fn new(name: impl Into<String>, contacts: Vec<Contact>) -> Self {
        Self {
            name: name.into(),
            contacts,
        }
    }

    /// Load a directory file.
    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?;
        let file: DirectoryFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse directory: {}", path.display()))?;
        Ok(Self::new(name, file.contacts))
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Contacts answering to `query`, in directory order.
    pub fn lookup(&self, query: &str) -> Vec<&Contact> {
        let digits = normalize_number(query);
        if digits.is_empty() {
            return Vec::new();
        }
        self.contacts
            .iter()
            .filter(|contact| {
                contact
                    .phone_numbers
                    .iter()
                    .any(|number| normalize_number(number) == digits)
                    || contact
                        .extension
                        .as_deref()
                        .is_some_and(|ext| normalize_number(ext) == digits)
            })
            .collect()
    }
}

fn to_record(contact: &Contact) -> Result<Record> {
    match serde_json::to_value(contact)? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("contact serialized to a non-object: {}", other),
    }
}

#[async_trait]
impl SearchSource for DirectorySearchSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Contacts from a local TOML directory"
    }

    async fn search(&self, queries: &[String]) -> Result<SearchResults> {
        let mut results = SearchResults::new();
        for query in queries {
            let records = self
                .lookup(query)
                .into_iter()
                .map(to_record)
                .collect::<Result<Vec<_>>>()?;
            results.insert(query.clone(), records);
        }
        Ok(results)
    }
}
