//! In-flight matching tracker.
//!
//! An ordered list of [`CacheKey`]s whose searches have been dispatched but
//! have not settled yet. A key in this list must not be dispatched again.
//! Removal is idempotent: settling a key that is already gone (for instance
//! after a reset) is a no-op.

use crate::actions::MatcherAction;
use crate::models::CacheKey;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchingList {
    keys: Vec<CacheKey>,
}

impl MatchingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key per query. Duplicates inside `queries` are not filtered.
    pub fn mark_started(&mut self, source_name: &str, queries: &[String]) {
        self.keys
            .extend(queries.iter().map(|q| CacheKey::new(source_name, q.as_str())));
    }

    /// Remove every key for `source_name` × `queries`, whatever the outcome.
    pub fn mark_settled(&mut self, source_name: &str, queries: &[String]) {
        self.keys
            .retain(|k| !(k.source_name == source_name && queries.contains(&k.query)));
    }

    pub fn reset(&mut self) {
        self.keys.clear();
    }

    pub fn contains(&self, source_name: &str, query: &str) -> bool {
        self.keys
            .iter()
            .any(|k| k.source_name == source_name && k.query == query)
    }

    pub fn keys(&self) -> &[CacheKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn reduce(&mut self, action: &MatcherAction) {
        match action {
            MatcherAction::Match {
                source_name,
                queries,
            } => self.mark_started(source_name, queries),
            MatcherAction::MatchSuccess {
                source_name,
                queries,
                ..
            }
            | MatcherAction::MatchError {
                source_name,
                queries,
            } => self.mark_settled(source_name, queries),
            MatcherAction::ResetSuccess => self.reset(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_start_and_settle() {
        let mut list = MatchingList::new();
        list.mark_started("contacts", &q(&["555", "556"]));
        list.mark_started("directory", &q(&["555"]));
        assert_eq!(list.len(), 3);
        assert!(list.contains("contacts", "556"));

        list.mark_settled("contacts", &q(&["555", "556"]));
        assert!(!list.contains("contacts", "555"));
        assert!(list.contains("directory", "555"));
        assert_eq!(list.keys(), &[CacheKey::new("directory", "555")]);
    }

    #[test]
    fn test_duplicates_are_kept_then_removed_together() {
        let mut list = MatchingList::new();
        list.mark_started("contacts", &q(&["555", "555"]));
        assert_eq!(list.len(), 2);
        list.mark_settled("contacts", &q(&["555"]));
        assert!(list.is_empty());
    }

    #[test]
    fn test_settle_after_reset_is_noop() {
        let mut list = MatchingList::new();
        list.mark_started("contacts", &q(&["555"]));
        list.reduce(&MatcherAction::ResetSuccess);
        assert!(list.is_empty());
        list.reduce(&MatcherAction::MatchError {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
        });
        assert!(list.is_empty());
    }

    #[test]
    fn test_reduce_match_actions() {
        let mut list = MatchingList::new();
        list.reduce(&MatcherAction::Match {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
        });
        assert!(list.contains("contacts", "555"));
        list.reduce(&MatcherAction::MatchSuccess {
            source_name: "contacts".to_string(),
            queries: q(&["555"]),
            results: Default::default(),
            timestamp: 0,
        });
        assert!(list.is_empty());
    }
}
