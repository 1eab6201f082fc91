//! Extension traits for search sources, query sources and session state.
//!
//! Feature modules plug into a matcher through two narrow contracts:
//!
//! ```text
//! ┌────────────────────┐          ┌────────────────────┐
//! │   QuerySource(s)   │          │  SearchSource(s)   │
//! │ call log, monitor, │          │ company directory, │
//! │ messages, ...      │          │ personal contacts  │
//! └─────────┬──────────┘          └─────────▲──────────┘
//!           │ queries()                     │ search(queries)
//!           ▼                               │
//!     ┌─────────────────────────────────────┴──┐
//!     │               DataMatcher              │
//!     │ cache filter → in-flight filter → fan  │
//!     └────────────────────────────────────────┘
//! ```
//!
//! Both are registered once and live as long as the matcher. Search sources
//! are identified by name; query sources by the identity of the shared
//! instance that was registered.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use phone_match::traits::{FnQuerySource, SearchSourceRegistry, QuerySourceRegistry};
//!
//! let mut queries = QuerySourceRegistry::new();
//! queries.register(Arc::new(FnQuerySource::new(|| vec!["+16505550100".to_string()]))).unwrap();
//!
//! let sources = SearchSourceRegistry::new();
//! assert!(sources.is_empty());
//! ```

use anyhow::Result;
use async_trait::async_trait;
use phone_match_core::models::SearchResults;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ConfigurationError;

// ═══════════════════════════════════════════════════════════════════════
// SearchSource Trait
// ═══════════════════════════════════════════════════════════════════════

/// A pluggable provider of entity lookups for a named domain.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use phone_match::traits::SearchSource;
/// use phone_match_core::models::SearchResults;
///
/// pub struct CrmSource;
///
/// #[async_trait]
/// impl SearchSource for CrmSource {
///     fn name(&self) -> &str { "crm" }
///
///     async fn search(&self, queries: &[String]) -> Result<SearchResults> {
///         // ... look every query up and return the hits
///         Ok(queries.iter().map(|q| (q.clone(), vec![])).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Unique source name. Tags every entity this source returns.
    fn name(&self) -> &str;

    /// One-line description, shown by `pmatch sources`.
    fn description(&self) -> &str {
        ""
    }

    /// Whether the source can serve searches. The matcher stays pending
    /// until every registered source is ready.
    fn is_ready(&self) -> bool {
        true
    }

    /// Look up every query.
    ///
    /// Queries absent from the returned map are recorded as not found. An
    /// `Err` leaves the cache untouched so the queries are retried on the
    /// next trigger.
    async fn search(&self, queries: &[String]) -> Result<SearchResults>;
}

// ═══════════════════════════════════════════════════════════════════════
// QuerySource Trait
// ═══════════════════════════════════════════════════════════════════════

/// A pluggable provider of the identifiers that currently need matching.
pub trait QuerySource: Send + Sync {
    fn queries(&self) -> Vec<String>;

    fn is_ready(&self) -> bool {
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════

/// Authentication state the matcher gates on.
pub trait Auth: Send + Sync {
    fn logged_in(&self) -> bool;
}

/// A settable login flag.
#[derive(Debug, Default)]
pub struct SessionFlag {
    logged_in: AtomicBool,
}

impl SessionFlag {
    pub fn new(logged_in: bool) -> Self {
        Self {
            logged_in: AtomicBool::new(logged_in),
        }
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::SeqCst);
    }
}

impl Auth for SessionFlag {
    fn logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Closure Adapters
// ═══════════════════════════════════════════════════════════════════════

/// Wraps an async closure as a [`SearchSource`].
pub struct FnSearchSource<F, R> {
    name: String,
    search_fn: F,
    ready_fn: R,
}

impl<F, Fut> FnSearchSource<F, fn() -> bool>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SearchResults>> + Send + 'static,
{
    /// A source that is always ready.
    pub fn new(name: impl Into<String>, search_fn: F) -> Self {
        fn always() -> bool {
            true
        }
        Self {
            name: name.into(),
            search_fn,
            ready_fn: always,
        }
    }
}

impl<F, R> FnSearchSource<F, R> {
    /// Replace the readiness check.
    pub fn with_ready_check<R2>(self, ready_fn: R2) -> FnSearchSource<F, R2>
    where
        R2: Fn() -> bool + Send + Sync + 'static,
    {
        FnSearchSource {
            name: self.name,
            search_fn: self.search_fn,
            ready_fn,
        }
    }
}

#[async_trait]
impl<F, Fut, R> SearchSource for FnSearchSource<F, R>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SearchResults>> + Send + 'static,
    R: Fn() -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        (self.ready_fn)()
    }

    async fn search(&self, queries: &[String]) -> Result<SearchResults> {
        (self.search_fn)(queries.to_vec()).await
    }
}

/// Wraps a closure as a [`QuerySource`].
pub struct FnQuerySource<F, R> {
    queries_fn: F,
    ready_fn: R,
}

impl<F> FnQuerySource<F, fn() -> bool>
where
    F: Fn() -> Vec<String> + Send + Sync + 'static,
{
    pub fn new(queries_fn: F) -> Self {
        fn always() -> bool {
            true
        }
        Self {
            queries_fn,
            ready_fn: always,
        }
    }
}

impl<F, R> FnQuerySource<F, R> {
    pub fn with_ready_check<R2>(self, ready_fn: R2) -> FnQuerySource<F, R2>
    where
        R2: Fn() -> bool + Send + Sync + 'static,
    {
        FnQuerySource {
            queries_fn: self.queries_fn,
            ready_fn,
        }
    }
}

impl<F, R> QuerySource for FnQuerySource<F, R>
where
    F: Fn() -> Vec<String> + Send + Sync + 'static,
    R: Fn() -> bool + Send + Sync + 'static,
{
    fn queries(&self) -> Vec<String> {
        (self.queries_fn)()
    }

    fn is_ready(&self) -> bool {
        (self.ready_fn)()
    }
}

/// A query source holding a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticQuerySource {
    queries: Vec<String>,
}

impl StaticQuerySource {
    pub fn new(queries: Vec<String>) -> Self {
        Self { queries }
    }
}

impl QuerySource for StaticQuerySource {
    fn queries(&self) -> Vec<String> {
        self.queries.clone()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registries
// ═══════════════════════════════════════════════════════════════════════

/// Search sources in registration order, unique by name.
#[derive(Default)]
pub struct SearchSourceRegistry {
    sources: Vec<Arc<dyn SearchSource>>,
}

impl SearchSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a source.
    ///
    /// Fails with [`ConfigurationError::MissingSourceName`] when the name is
    /// empty and [`ConfigurationError::DuplicateSearchSource`] when it is
    /// taken.
    pub fn register(&mut self, source: Arc<dyn SearchSource>) -> Result<(), ConfigurationError> {
        let name = source.name();
        if name.is_empty() {
            return Err(ConfigurationError::MissingSourceName);
        }
        if self.find(name).is_some() {
            return Err(ConfigurationError::DuplicateSearchSource(name.to_string()));
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn sources(&self) -> &[Arc<dyn SearchSource>] {
        &self.sources
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn SearchSource>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    pub fn all_ready(&self) -> bool {
        self.sources.iter().all(|s| s.is_ready())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

/// Query sources in registration order, unique by instance identity.
#[derive(Default)]
pub struct QuerySourceRegistry {
    sources: Vec<Arc<dyn QuerySource>>,
}

impl QuerySourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a source. Registering the same `Arc` (or a clone of it)
    /// twice fails with [`ConfigurationError::DuplicateQuerySource`];
    /// distinct instances with identical behaviour coexist.
    pub fn register(&mut self, source: Arc<dyn QuerySource>) -> Result<(), ConfigurationError> {
        if self
            .sources
            .iter()
            .any(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(&source)))
        {
            return Err(ConfigurationError::DuplicateQuerySource);
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn sources(&self) -> &[Arc<dyn QuerySource>] {
        &self.sources
    }

    /// Every registered source's queries, concatenated in registration order.
    pub fn collect_queries(&self) -> Vec<String> {
        self.sources.iter().flat_map(|s| s.queries()).collect()
    }

    pub fn all_ready(&self) -> bool {
        self.sources.iter().all(|s| s.is_ready())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_source(name: &str) -> Arc<dyn SearchSource> {
        Arc::new(FnSearchSource::new(name, |_queries: Vec<String>| async {
            Ok::<_, anyhow::Error>(SearchResults::new())
        }))
    }

    #[test]
    fn test_search_registry_rejects_missing_and_duplicate_names() {
        let mut registry = SearchSourceRegistry::new();
        assert_eq!(
            registry.register(empty_source("")),
            Err(ConfigurationError::MissingSourceName)
        );
        registry.register(empty_source("contacts")).unwrap();
        let err = registry.register(empty_source("contacts")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "search source 'contacts' is already registered"
        );
        registry.register(empty_source("directory")).unwrap();
        let names: Vec<&str> = registry.sources().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["contacts", "directory"]);
    }

    #[test]
    fn test_query_registry_identity() {
        let mut registry = QuerySourceRegistry::new();
        let a: Arc<dyn QuerySource> = Arc::new(StaticQuerySource::new(vec!["1".to_string()]));
        let b: Arc<dyn QuerySource> = Arc::new(StaticQuerySource::new(vec!["1".to_string()]));
        registry.register(a.clone()).unwrap();
        registry.register(b).unwrap();
        assert_eq!(
            registry.register(a),
            Err(ConfigurationError::DuplicateQuerySource)
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.collect_queries(), vec!["1", "1"]);
    }

    #[test]
    fn test_ready_checks() {
        let mut registry = QuerySourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        let check = flag.clone();
        registry
            .register(Arc::new(
                FnQuerySource::new(Vec::new)
                    .with_ready_check(move || check.load(Ordering::SeqCst)),
            ))
            .unwrap();
        assert!(!registry.all_ready());
        flag.store(true, Ordering::SeqCst);
        assert!(registry.all_ready());
    }

    #[test]
    fn test_session_flag() {
        let session = SessionFlag::new(false);
        assert!(!session.logged_in());
        session.set_logged_in(true);
        assert!(session.logged_in());
    }
}
