//! Actions applied to matcher state.
//!
//! Every state change of a matcher is one [`MatcherAction`]. Each state slice
//! (module status, in-flight tracker, cache) has its own reducer; all of them
//! see every action, and slices that do not care about an action return
//! themselves unchanged. See [`MatcherState::apply`](crate::state::MatcherState::apply).

use crate::models::SearchResults;

#[derive(Debug, Clone, PartialEq)]
pub enum MatcherAction {
    /// Lifecycle: pending → initializing.
    Init,
    /// Lifecycle: initializing → ready, sweeping `expired_keys` from the cache.
    InitSuccess { expired_keys: Vec<String> },
    /// Lifecycle: ready → resetting.
    Reset,
    /// Lifecycle: resetting → pending; clears the in-flight tracker.
    ResetSuccess,
    /// Queries dispatched to a source.
    Match {
        source_name: String,
        queries: Vec<String>,
    },
    /// A source answered. Every query in `queries` is recorded; queries
    /// missing from `results` count as not found.
    MatchSuccess {
        source_name: String,
        queries: Vec<String>,
        results: SearchResults,
        timestamp: i64,
    },
    /// A source failed. Only the tracker is updated.
    MatchError {
        source_name: String,
        queries: Vec<String>,
    },
}

impl MatcherAction {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MatcherAction::Init => "init",
            MatcherAction::InitSuccess { .. } => "initSuccess",
            MatcherAction::Reset => "reset",
            MatcherAction::ResetSuccess => "resetSuccess",
            MatcherAction::Match { .. } => "match",
            MatcherAction::MatchSuccess { .. } => "matchSuccess",
            MatcherAction::MatchError { .. } => "matchError",
        }
    }
}
