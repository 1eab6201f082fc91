//! The data matcher engine.
//!
//! A [`DataMatcher`] resolves raw identifiers into entities by fanning query
//! batches out to registered [`SearchSource`]s, caching every answer per
//! `(source, query)` and publishing the union as [`DataMatcher::data_mapping`].
//!
//! # Lifecycle
//!
//! The matcher starts `pending`. [`on_state_change`](DataMatcher::on_state_change)
//! is the single reactive hook; call it whenever the session, the storage or
//! a source's readiness changes.
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | pending, logged in, storage absent or ready, every source ready | `init` → hydrate → sweep expired → `initSuccess` → [`trigger_match`](DataMatcher::trigger_match) |
//! | ready, logged out or storage not ready | `reset` → `resetSuccess` (tracker cleared, back to pending) |
//!
//! # Matching
//!
//! 1. [`trigger_match`](DataMatcher::trigger_match) concatenates every query
//!    source's queries and calls [`match_queries`](DataMatcher::match_queries).
//! 2. For every search source, in registration order and under one lock,
//!    queries with a fresh cache entry or an in-flight search are dropped and
//!    the rest are marked in flight.
//! 3. The searches run concurrently. Each settles with its own state update:
//!    `matchSuccess` records results and clears the tracker, `matchError`
//!    only clears the tracker.
//!
//! A search that settles after a reset belongs to an old session and is
//! discarded without touching state.

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use phone_match_core::actions::MatcherAction;
use phone_match_core::cache::{expired_keys, CachePolicy, CacheState, DataMap};
use phone_match_core::clock::{Clock, SystemClock};
use phone_match_core::models::{CacheKey, SearchResults};
use phone_match_core::state::MatcherState;
use phone_match_core::status::ModuleStatus;
use phone_match_core::store::Storage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{cache_storage_key, MatcherConfig};
use crate::error::{ConfigurationError, SearchError};
use crate::traits::{Auth, QuerySource, QuerySourceRegistry, SearchSource, SearchSourceRegistry};

/// A search whose queries are marked in flight and which has yet to run.
struct PendingSearch {
    source: Arc<dyn SearchSource>,
    queries: Vec<String>,
    session: u64,
}

pub struct DataMatcher {
    name: String,
    policy: CachePolicy,
    search_timeout: Option<Duration>,
    auth: Arc<dyn Auth>,
    storage: Option<Arc<dyn Storage>>,
    clock: Arc<dyn Clock>,
    search_sources: RwLock<SearchSourceRegistry>,
    query_sources: RwLock<QuerySourceRegistry>,
    state: Mutex<MatcherState>,
}

impl DataMatcher {
    /// Create a pending matcher. Without `storage` the cache lives only as
    /// long as the matcher.
    pub fn new(
        config: &MatcherConfig,
        auth: Arc<dyn Auth>,
        storage: Option<Arc<dyn Storage>>,
    ) -> Self {
        Self {
            name: config.name.clone(),
            policy: config.cache_policy(),
            search_timeout: config.search_timeout(),
            auth,
            storage,
            clock: Arc::new(SystemClock),
            search_sources: RwLock::new(SearchSourceRegistry::new()),
            query_sources: RwLock::new(QuerySourceRegistry::new()),
            state: Mutex::new(MatcherState::new()),
        }
    }

    /// Replace the wall clock used for timestamps and expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Key under which the cache is persisted.
    pub fn storage_key(&self) -> String {
        cache_storage_key(&self.name)
    }

    // ── Registration ────────────────────────────────────────────────────

    pub fn add_search_source(
        &self,
        source: Arc<dyn SearchSource>,
    ) -> Result<(), ConfigurationError> {
        let name = source.name().to_string();
        self.search_sources.write().register(source)?;
        debug!(matcher = %self.name, source = %name, "registered search source");
        Ok(())
    }

    pub fn add_query_source(&self, source: Arc<dyn QuerySource>) -> Result<(), ConfigurationError> {
        self.query_sources.write().register(source)
    }

    /// Registered search sources, in registration order.
    pub fn search_sources(&self) -> Vec<Arc<dyn SearchSource>> {
        self.search_sources.read().sources().to_vec()
    }

    // ── Read surface ────────────────────────────────────────────────────

    pub fn status(&self) -> ModuleStatus {
        self.state.lock().status
    }

    pub fn ready(&self) -> bool {
        self.status().is_ready()
    }

    pub fn pending(&self) -> bool {
        self.status().is_pending()
    }

    /// Query → entities from every source. The same `Arc` is returned until
    /// the data map actually changes.
    pub fn data_mapping(&self) -> Arc<DataMap> {
        Arc::clone(self.state.lock().cache.data_map())
    }

    /// Snapshot of the persisted cache state.
    pub fn cache(&self) -> CacheState {
        self.state.lock().cache.clone()
    }

    /// Keys currently in flight, in dispatch order.
    pub fn matching(&self) -> Vec<CacheKey> {
        self.state.lock().matching.keys().to_vec()
    }

    /// Keys whose entries have outlived their window as of now.
    pub fn expired_keys(&self) -> Vec<String> {
        let state = self.state.lock();
        expired_keys(state.cache.match_record(), &self.policy, self.clock.now_ms())
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Every registered query source and search source reports ready.
    pub fn ready_check(&self) -> bool {
        self.query_sources.read().all_ready() && self.search_sources.read().all_ready()
    }

    fn storage_ready(&self) -> bool {
        self.storage.as_ref().map_or(true, |s| s.is_ready())
    }

    fn init_gates_open(&self) -> bool {
        self.auth.logged_in() && self.storage_ready() && self.ready_check()
    }

    fn reset_required(&self) -> bool {
        !self.auth.logged_in() || !self.storage_ready()
    }

    pub fn should_init(&self) -> bool {
        self.pending() && self.init_gates_open()
    }

    pub fn should_reset(&self) -> bool {
        self.ready() && self.reset_required()
    }

    /// Re-evaluate the lifecycle after an upstream change.
    ///
    /// Initializing runs the first [`trigger_match`](Self::trigger_match),
    /// so this resolves once those searches settle.
    pub async fn on_state_change(&self) {
        if self.try_init() {
            self.trigger_match().await;
        } else {
            self.try_reset();
        }
    }

    // Gates run user callbacks, so they are evaluated before taking the
    // state lock; only the status is re-checked under it.
    fn try_init(&self) -> bool {
        if !self.should_init() {
            return false;
        }
        let mut state = self.state.lock();
        if !state.status.is_pending() {
            return false;
        }

        self.apply_locked(&mut state, &MatcherAction::Init);
        if let Some(cache) = self.load_cache() {
            if cache != state.cache {
                state.cache = cache;
            }
        }
        let expired = expired_keys(state.cache.match_record(), &self.policy, self.clock.now_ms());
        info!(
            matcher = %self.name,
            cached = state.cache.match_record().len(),
            expired = expired.len(),
            "matcher initialized"
        );
        self.apply_locked(
            &mut state,
            &MatcherAction::InitSuccess {
                expired_keys: expired,
            },
        );
        true
    }

    fn try_reset(&self) -> bool {
        if !self.should_reset() {
            return false;
        }
        let mut state = self.state.lock();
        if !state.status.is_ready() {
            return false;
        }
        let dropped = state.matching.len();
        self.apply_locked(&mut state, &MatcherAction::Reset);
        self.apply_locked(&mut state, &MatcherAction::ResetSuccess);
        info!(matcher = %self.name, in_flight_dropped = dropped, "matcher reset");
        true
    }

    fn load_cache(&self) -> Option<CacheState> {
        let storage = self.storage.as_ref()?;
        let key = self.storage_key();
        match storage.get_item(&key) {
            Ok(Some(value)) => match serde_json::from_value::<CacheState>(value) {
                Ok(cache) => Some(cache),
                Err(err) => {
                    warn!(matcher = %self.name, "discarding unreadable match cache: {}", err);
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(matcher = %self.name, "failed to load match cache: {:#}", err);
                None
            }
        }
    }

    fn persist(&self, cache: &CacheState) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = serde_json::to_value(cache)
            .map_err(anyhow::Error::from)
            .and_then(|value| storage.set_item(&self.storage_key(), &value));
        if let Err(err) = result {
            warn!(matcher = %self.name, "failed to persist match cache: {:#}", err);
        }
    }

    fn apply_locked(&self, state: &mut MatcherState, action: &MatcherAction) {
        let cache_changed = state.apply(action);
        debug!(
            matcher = %self.name,
            action = action.kind(),
            status = %state.status,
            in_flight = state.matching.len(),
            "applied action"
        );
        if cache_changed {
            self.persist(&state.cache);
        }
    }

    // ── Matching ────────────────────────────────────────────────────────

    /// Match whatever the query sources currently want. No-op unless ready.
    pub async fn trigger_match(&self) {
        if !self.ready() {
            return;
        }
        let queries = self.query_sources.read().collect_queries();
        if queries.is_empty() {
            return;
        }
        self.match_queries(&queries, false).await;
    }

    /// Match `queries` against every search source. No-op unless ready.
    ///
    /// With `ignore_cache` fresh entries are searched again; queries already
    /// in flight are still skipped.
    pub async fn match_queries(&self, queries: &[String], ignore_cache: bool) {
        if queries.is_empty() {
            return;
        }
        let sources = self.search_sources();
        let searches: Vec<PendingSearch> = {
            let mut state = self.state.lock();
            if !state.status.is_ready() {
                return;
            }
            sources
                .iter()
                .filter_map(|source| self.begin_search(&mut state, source, queries, ignore_cache))
                .collect()
        };
        join_all(searches.into_iter().map(|search| self.run_search(search))).await;
    }

    /// Match `queries` against one named source. No-op unless ready.
    pub async fn match_source(&self, source_name: &str, queries: &[String], ignore_cache: bool) {
        if queries.is_empty() {
            return;
        }
        let Some(source) = self.search_sources.read().find(source_name).cloned() else {
            warn!(matcher = %self.name, source = %source_name, "no such search source");
            return;
        };
        let search = {
            let mut state = self.state.lock();
            if !state.status.is_ready() {
                return;
            }
            self.begin_search(&mut state, &source, queries, ignore_cache)
        };
        if let Some(search) = search {
            self.run_search(search).await;
        }
    }

    /// Filter and mark in flight. Must run under the state lock so that no
    /// other caller can dispatch the same key in between.
    fn begin_search(
        &self,
        state: &mut MatcherState,
        source: &Arc<dyn SearchSource>,
        queries: &[String],
        ignore_cache: bool,
    ) -> Option<PendingSearch> {
        let source_name = source.name();
        let queries = state.pending_queries(
            source_name,
            queries,
            &self.policy,
            self.clock.now_ms(),
            ignore_cache,
        );
        if queries.is_empty() {
            debug!(matcher = %self.name, source = %source_name, "nothing to search");
            return None;
        }
        self.apply_locked(
            state,
            &MatcherAction::Match {
                source_name: source_name.to_string(),
                queries: queries.clone(),
            },
        );
        Some(PendingSearch {
            source: Arc::clone(source),
            queries,
            session: state.session,
        })
    }

    async fn run_search(&self, search: PendingSearch) {
        let PendingSearch {
            source,
            queries,
            session,
        } = search;
        debug!(
            matcher = %self.name,
            source = %source.name(),
            queries = queries.len(),
            "dispatching search"
        );
        let outcome = self.search(source.as_ref(), &queries).await;

        let mut state = self.state.lock();
        if state.session != session {
            debug!(
                matcher = %self.name,
                source = %source.name(),
                "discarding search from a previous session"
            );
            return;
        }
        let source_name = source.name().to_string();
        let action = match outcome {
            Ok(results) => MatcherAction::MatchSuccess {
                source_name,
                queries,
                results,
                timestamp: self.clock.now_ms(),
            },
            Err(err) => {
                warn!(matcher = %self.name, "{}", err);
                MatcherAction::MatchError {
                    source_name,
                    queries,
                }
            }
        };
        self.apply_locked(&mut state, &action);
    }

    async fn search(
        &self,
        source: &dyn SearchSource,
        queries: &[String],
    ) -> Result<SearchResults, SearchError> {
        let failed = |error| SearchError::Failed {
            source_name: source.name().to_string(),
            error,
        };
        match self.search_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, source.search(queries)).await {
                Ok(result) => result.map_err(failed),
                Err(_) => Err(SearchError::TimedOut {
                    source_name: source.name().to_string(),
                    timeout,
                }),
            },
            None => source.search(queries).await.map_err(failed),
        }
    }
}
