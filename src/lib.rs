//! # Phone Match
//!
//! A matching and caching engine that resolves raw identifiers (phone
//! numbers, session ids) into richer entities such as contacts.
//!
//! Pluggable search sources answer batches of queries; the matcher caches
//! every answer per `(source, query)` with a time-to-live, keeps at most one
//! search in flight per key, and publishes a query → entities mapping.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Query sources│──▶│  DataMatcher │──▶│ Search       │
//! │ (numbers)    │   │ filter+track │◀──│ sources      │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │
//!                ┌──────────┴──────────┐
//!                ▼                     ▼
//!          ┌───────────┐         ┌───────────┐
//!          │ dataMap   │         │ Storage   │
//!          │ (readers) │         │ (cache)   │
//!          └───────────┘         └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use phone_match::config::MatcherConfig;
//! use phone_match::contact_matcher::ContactMatcher;
//! use phone_match::directory::{Contact, DirectorySearchSource};
//! use phone_match::traits::SessionFlag;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let matcher = ContactMatcher::new(
//!     &MatcherConfig::default(),
//!     Arc::new(SessionFlag::new(true)),
//!     None,
//! );
//! matcher.add_search_source(Arc::new(DirectorySearchSource::new(
//!     "company",
//!     vec![Contact {
//!         id: "c-1".into(),
//!         name: "Ada".into(),
//!         phone_numbers: vec!["555-0100".into()],
//!         extension: None,
//!     }],
//! )))?;
//! matcher.on_state_change().await;
//! assert!(matcher.has_match_number("5550100", false).await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`engine`] | The [`DataMatcher`](engine::DataMatcher) lifecycle and dispatch |
//! | [`contact_matcher`] | Phone-number conveniences over the engine |
//! | [`traits`] | Search/query source traits, closure adapters, registries |
//! | [`directory`] | TOML contact directory search source |
//! | [`file_store`] | JSON file storage backend |
//! | [`error`] | Configuration and search errors |
//! | [`commands`] | `pmatch` subcommands |
//!
//! State types (cache, tracker, status, actions) live in `phone_match_core`.

pub mod commands;
pub mod config;
pub mod contact_matcher;
pub mod directory;
pub mod engine;
pub mod error;
pub mod file_store;
pub mod traits;

pub use contact_matcher::ContactMatcher;
pub use engine::DataMatcher;
pub use error::{ConfigurationError, SearchError};
