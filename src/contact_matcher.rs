//! Phone-number oriented matcher.
//!
//! [`ContactMatcher`] is a [`DataMatcher`] with a few conveniences for the
//! common "who is calling?" lookups. Everything else (registration, the
//! lifecycle hook, the read surface) is reached through `Deref`.

use std::ops::Deref;
use std::sync::Arc;

use phone_match_core::store::Storage;

use crate::config::MatcherConfig;
use crate::engine::DataMatcher;
use crate::traits::Auth;

pub struct ContactMatcher {
    matcher: DataMatcher,
}

impl ContactMatcher {
    pub fn new(config: &MatcherConfig, auth: Arc<dyn Auth>, storage: Option<Arc<dyn Storage>>) -> Self {
        Self::from_matcher(DataMatcher::new(config, auth, storage))
    }

    pub fn from_matcher(matcher: DataMatcher) -> Self {
        Self { matcher }
    }

    /// Match one number and report whether any source knows it.
    pub async fn has_match_number(&self, phone_number: &str, ignore_cache: bool) -> bool {
        self.matcher
            .match_queries(&[phone_number.to_string()], ignore_cache)
            .await;
        self.matcher
            .data_mapping()
            .get(phone_number)
            .is_some_and(|entities| !entities.is_empty())
    }

    /// Search one number again even if its cache entry is fresh.
    pub async fn force_match_number(&self, phone_number: &str) {
        self.matcher
            .match_queries(&[phone_number.to_string()], true)
            .await;
    }

    pub async fn force_match_batch_numbers(&self, phone_numbers: &[String]) {
        self.matcher.match_queries(phone_numbers, true).await;
    }

    pub fn into_inner(self) -> DataMatcher {
        self.matcher
    }
}

impl Deref for ContactMatcher {
    type Target = DataMatcher;

    fn deref(&self) -> &DataMatcher {
        &self.matcher
    }
}
