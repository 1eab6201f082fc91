//! Combined matcher state.
//!
//! [`MatcherState`] bundles the three slices a matcher owns and applies each
//! [`MatcherAction`] to all of them in one step, so readers never observe a
//! status, tracker and cache that disagree.

use crate::actions::MatcherAction;
use crate::cache::{CachePolicy, CacheState};
use crate::matching::MatchingList;
use crate::status::ModuleStatus;

#[derive(Debug, Clone, Default)]
pub struct MatcherState {
    pub status: ModuleStatus,
    pub matching: MatchingList,
    pub cache: CacheState,
    /// Bumped on every `ResetSuccess`. Searches capture it before they are
    /// dispatched and drop their outcome if it changed meanwhile.
    pub session: u64,
}

impl MatcherState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action to every slice. Returns `true` when the cache changed.
    pub fn apply(&mut self, action: &MatcherAction) -> bool {
        self.status = self.status.reduce(action);
        self.matching.reduce(action);
        let cache = self.cache.reduce(action);
        let changed = !cache.ptr_eq(&self.cache);
        self.cache = cache;
        if matches!(action, MatcherAction::ResetSuccess) {
            self.session = self.session.wrapping_add(1);
        }
        changed
    }

    /// Narrow `queries` to the ones `source_name` still has to search.
    ///
    /// A query is dropped when, in this order:
    /// 1. a fresh match record exists for it (skipped when `ignore_cache`),
    /// 2. it is already in flight for this source,
    /// 3. it already appeared earlier in `queries`.
    pub fn pending_queries(
        &self,
        source_name: &str,
        queries: &[String],
        policy: &CachePolicy,
        now: i64,
        ignore_cache: bool,
    ) -> Vec<String> {
        let mut pending: Vec<String> = Vec::new();
        for query in queries {
            if !ignore_cache {
                if let Some(entry) = self.cache.entry(source_name, query) {
                    if policy.is_fresh(entry, now) {
                        continue;
                    }
                }
            }
            if self.matching.contains(source_name, query) {
                continue;
            }
            if pending.contains(query) {
                continue;
            }
            pending.push(query.clone());
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CacheKey, SearchResults};

    fn q(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ready_state() -> MatcherState {
        let mut state = MatcherState::new();
        state.apply(&MatcherAction::Init);
        state.apply(&MatcherAction::InitSuccess {
            expired_keys: vec![],
        });
        state
    }

    #[test]
    fn test_filter_fresh_and_in_flight() {
        let policy = CachePolicy {
            ttl_ms: 1000,
            no_match_ttl_ms: 100,
        };
        let mut found = SearchResults::new();
        found.insert("fresh".to_string(), vec![serde_json::Map::new()]);
        let mut state = ready_state();
        state.apply(&MatcherAction::MatchSuccess {
            source_name: "contacts".to_string(),
            queries: q(&["fresh", "stale"]),
            results: found,
            timestamp: 0,
        });
        state.apply(&MatcherAction::Match {
            source_name: "contacts".to_string(),
            queries: q(&["flying"]),
        });

        // both records still inside their windows
        let pending = state.pending_queries(
            "contacts",
            &q(&["fresh", "stale", "flying", "new", "new"]),
            &policy,
            50,
            false,
        );
        assert_eq!(pending, q(&["new"]));

        // the not-found record has outlived the shorter window
        let pending = state.pending_queries(
            "contacts",
            &q(&["fresh", "stale", "flying", "new"]),
            &policy,
            150,
            false,
        );
        assert_eq!(pending, q(&["stale", "new"]));
    }

    #[test]
    fn test_ignore_cache_still_respects_in_flight() {
        let policy = CachePolicy::default();
        let mut state = ready_state();
        state.apply(&MatcherAction::MatchSuccess {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
            results: SearchResults::new(),
            timestamp: 0,
        });
        state.apply(&MatcherAction::Match {
            source_name: "contacts".to_string(),
            queries: q(&["556"]),
        });
        let pending = state.pending_queries("contacts", &q(&["555", "556"]), &policy, 1, true);
        assert_eq!(pending, q(&["555"]));
    }

    #[test]
    fn test_filter_is_per_source() {
        let policy = CachePolicy::default();
        let mut state = ready_state();
        state.apply(&MatcherAction::Match {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
        });
        let pending = state.pending_queries("directory", &q(&["555"]), &policy, 0, false);
        assert_eq!(pending, q(&["555"]));
    }

    #[test]
    fn test_reset_success_clears_tracker_and_bumps_session() {
        let mut state = ready_state();
        state.apply(&MatcherAction::Match {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
        });
        let session = state.session;
        state.apply(&MatcherAction::Reset);
        state.apply(&MatcherAction::ResetSuccess);
        assert!(state.status.is_pending());
        assert!(state.matching.is_empty());
        assert_ne!(state.session, session);
    }

    #[test]
    fn test_apply_reports_cache_changes() {
        let mut state = ready_state();
        assert!(!state.apply(&MatcherAction::Match {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
        }));
        assert!(state.apply(&MatcherAction::MatchSuccess {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
            results: SearchResults::new(),
            timestamp: 0,
        }));
        assert!(state.apply(&MatcherAction::InitSuccess {
            expired_keys: vec![CacheKey::new("contacts", "555").encode()],
        }));
        assert!(state.cache.match_record().is_empty());
        assert!(!state.apply(&MatcherAction::InitSuccess {
            expired_keys: vec![CacheKey::new("contacts", "555").encode()],
        }));
    }
}
