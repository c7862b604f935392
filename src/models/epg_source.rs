//! EPG source definitions

use serde::{Deserialize, Serialize};

use crate::sources::feed_cache::CacheStatus;

/// One configured remote XMLTV feed
///
/// Loaded once at startup and never mutated while requests are in flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Ascending: lower values are tried first
    pub priority: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// When false the source is skipped once any earlier source has failed
    #[serde(default = "default_true")]
    pub retry_on_not_found: bool,
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    pub fn new<I, N, U>(id: I, name: N, url: U, priority: u32) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        U: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            priority,
            enabled: true,
            retry_on_not_found: true,
        }
    }

    pub fn with_retry_on_not_found(mut self, retry: bool) -> Self {
        self.retry_on_not_found = retry;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Source listing entry returned by the `sources` action
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub name: String,
    pub url: String,
    pub priority: u32,
    pub enabled: bool,
    pub retry_on_not_found: bool,
    pub cache: CacheStatus,
}

impl SourceSummary {
    pub fn new(source: &SourceConfig, cache: CacheStatus) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            url: source.url.clone(),
            priority: source.priority,
            enabled: source.enabled,
            retry_on_not_found: source.retry_on_not_found,
            cache,
        }
    }
}
