//! Error types surfaced by the matcher.
//!
//! Registration mistakes are programmer errors and come back synchronously
//! as [`ConfigurationError`]. Search failures are [`SearchError`]s; the
//! engine logs them and recovers locally, so they never reach consumers.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("search source name is required")]
    MissingSourceName,

    #[error("search source '{0}' is already registered")]
    DuplicateSearchSource(String),

    #[error("query source is already registered")]
    DuplicateQuerySource,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search source '{source_name}' failed: {error:#}")]
    Failed {
        source_name: String,
        error: anyhow::Error,
    },

    #[error("search source '{source_name}' timed out after {timeout:?}")]
    TimedOut {
        source_name: String,
        timeout: Duration,
    },
}
