//! Domain records shared by the matcher, the search service and the web layer

use serde::Serialize;

pub mod epg_source;

pub use epg_source::{SourceConfig, SourceSummary};

/// A `<channel>` entry from one feed
///
/// `id` is only unique within the feed it came from and is never compared
/// across sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
}

impl ChannelRecord {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
        }
    }

    pub fn with_icon<S: Into<String>>(mut self, icon: S) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// One programme of the requested day, shaped for the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRecord {
    /// Local `HH:MM` as written in the feed
    pub start: String,
    /// Local `HH:MM`, `"00:00"` when the stop time is unusable
    pub end: String,
    pub title: String,
    pub desc: String,
}

/// Best channel found for a query in one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub channel_id: String,
    pub channel_name: String,
    pub icon: Option<String>,
    /// Always within 0..=100
    pub score: u8,
    pub source_id: String,
    pub source_name: String,
    pub source_url: String,
}

/// Diagnostic entry for one source attempted during a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriedSource {
    pub source: String,
    pub name: String,
    pub url: String,
    pub success: bool,
    pub message: String,
}

/// Ordered record of every source attempted while serving one request
///
/// Created fresh for each search and returned with its outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TriedSourceLog {
    entries: Vec<TriedSource>,
}

impl TriedSourceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success<M: Into<String>>(&mut self, source: &SourceConfig, message: M) {
        self.push(source, true, message.into());
    }

    pub fn record_failure<M: Into<String>>(&mut self, source: &SourceConfig, message: M) {
        self.push(source, false, message.into());
    }

    fn push(&mut self, source: &SourceConfig, success: bool, message: String) {
        self.entries.push(TriedSource {
            source: source.id.clone(),
            name: source.name.clone(),
            url: source.url.clone(),
            success,
            message,
        });
    }

    pub fn entries(&self) -> &[TriedSource] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attempts that did not produce a result
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.success).count()
    }
}
