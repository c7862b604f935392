//! Multi-source EPG search
//!
//! A lookup either targets one named source or walks every enabled source in
//! priority order until one of them yields programmes for the requested day.
//! Sources are tried strictly one after another so that an early hit saves
//! the download of every later feed.
//!
//! Failures of individual sources never abort a search: each attempt, good or
//! bad, is recorded in the request's [`TriedSourceLog`], and only running out
//! of eligible sources produces a not-found outcome. That outcome carries
//! channel name suggestions gathered from every enabled source.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{AppResult, SourceError};
use crate::models::{MatchResult, ProgramRecord, SourceConfig, SourceSummary, TriedSourceLog};
use crate::services::channel_matcher::ChannelMatcher;
use crate::services::program_extractor::extract_programs;
use crate::sources::{FeedLoader, SourceRegistry, XmltvFeed};

/// A validated lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub channel: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Preferred source id; unknown or disabled ids fall back to all sources
    pub source: Option<String>,
    /// Unsuccessful attempts allowed before giving up
    pub max_retry: usize,
}

/// Matched channel and its programmes for the day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgMatch {
    pub matched: MatchResult,
    pub programs: Vec<ProgramRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found {
        found: EpgMatch,
        tried_sources: TriedSourceLog,
    },
    NotFound {
        suggestions: Vec<String>,
        tried_sources: TriedSourceLog,
    },
}

impl SearchOutcome {
    pub fn tried_sources(&self) -> &TriedSourceLog {
        match self {
            Self::Found { tried_sources, .. } | Self::NotFound { tried_sources, .. } => {
                tried_sources
            }
        }
    }
}

/// Feeds loaded while serving one request, keyed by source id
///
/// `None` marks a source whose feed could not be loaded.
type LoadedFeeds = HashMap<String, Option<XmltvFeed>>;

#[derive(Clone)]
pub struct EpgSearchService {
    registry: Arc<SourceRegistry>,
    loader: FeedLoader,
    matcher: ChannelMatcher,
}

impl EpgSearchService {
    pub fn new(registry: Arc<SourceRegistry>, loader: FeedLoader, matcher: ChannelMatcher) -> Self {
        Self {
            registry,
            loader,
            matcher,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        let selected = request
            .source
            .as_deref()
            .and_then(|id| self.registry.get_enabled(id));

        let outcome = match selected {
            Some(source) => self.search_single(source, request).await,
            None => {
                if let Some(id) = &request.source {
                    debug!("Source '{}' is unknown or disabled, searching all sources", id);
                }
                self.search_all(request).await
            }
        };

        match &outcome {
            SearchOutcome::Found { found, tried_sources } => info!(
                "Found '{}' for '{}' on {} in source '{}' (score {}, {} programs, {} sources tried)",
                found.matched.channel_name,
                request.channel,
                request.date,
                found.matched.source_id,
                found.matched.score,
                found.programs.len(),
                tried_sources.len()
            ),
            SearchOutcome::NotFound {
                suggestions,
                tried_sources,
            } => info!(
                "No EPG for '{}' on {} after {} sources ({} suggestions)",
                request.channel,
                request.date,
                tried_sources.len(),
                suggestions.len()
            ),
        }

        outcome
    }

    async fn search_single(&self, source: &SourceConfig, request: &SearchRequest) -> SearchOutcome {
        let mut tried_sources = TriedSourceLog::new();
        let mut loaded = LoadedFeeds::new();

        match self.try_source(source, request, &mut loaded).await {
            Ok(found) => {
                tried_sources.record_success(source, success_message(&found));
                SearchOutcome::Found {
                    found,
                    tried_sources,
                }
            }
            Err(message) => {
                tried_sources.record_failure(source, message);
                let suggestions = match loaded.get(&source.id) {
                    Some(Some(feed)) => self.matcher.suggest(&request.channel, &feed.channels),
                    _ => Vec::new(),
                };
                SearchOutcome::NotFound {
                    suggestions,
                    tried_sources,
                }
            }
        }
    }

    async fn search_all(&self, request: &SearchRequest) -> SearchOutcome {
        let max_retry = request.max_retry.max(1);
        let mut tried_sources = TriedSourceLog::new();
        let mut loaded = LoadedFeeds::new();

        for source in self.registry.enabled_by_priority() {
            if tried_sources.failures() >= max_retry {
                debug!("Giving up after {} unsuccessful sources", max_retry);
                break;
            }
            if tried_sources.failures() > 0 && !source.retry_on_not_found {
                debug!(
                    "Skipping source '{}': not retried after an earlier failure",
                    source.id
                );
                continue;
            }

            match self.try_source(source, request, &mut loaded).await {
                Ok(found) => {
                    tried_sources.record_success(source, success_message(&found));
                    return SearchOutcome::Found {
                        found,
                        tried_sources,
                    };
                }
                Err(message) => tried_sources.record_failure(source, message),
            }
        }

        let suggestions = self.collect_suggestions(request, &mut loaded).await;
        SearchOutcome::NotFound {
            suggestions,
            tried_sources,
        }
    }

    /// One source attempt; the error is the message for the tried-source log
    async fn try_source(
        &self,
        source: &SourceConfig,
        request: &SearchRequest,
        loaded: &mut LoadedFeeds,
    ) -> Result<EpgMatch, String> {
        debug!(
            "Searching source '{}' (priority {}) for '{}'",
            source.id, source.priority, request.channel
        );

        let feed = match self.loader.load(source).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Source '{}' unavailable: {}", source.id, e.summary());
                loaded.insert(source.id.clone(), None);
                return Err(e.summary());
            }
        };

        let result = match self.matcher.find_match(&request.channel, &feed.channels) {
            None => {
                debug!("No channel in source '{}' matches '{}'", source.id, request.channel);
                Err(format!("channel '{}' not found", request.channel))
            }
            Some(m) => {
                let programs = extract_programs(&m.channel.id, &request.date, &feed);
                if programs.is_empty() {
                    debug!(
                        "Source '{}' matched '{}' but has no programs on {}",
                        source.id, m.channel.name, request.date
                    );
                    Err(format!(
                        "matched '{}' but no programs on {}",
                        m.channel.name, request.date
                    ))
                } else {
                    Ok(EpgMatch {
                        matched: MatchResult {
                            channel_id: m.channel.id.clone(),
                            channel_name: m.channel.name.clone(),
                            icon: m.channel.icon.clone(),
                            score: m.score,
                            source_id: source.id.clone(),
                            source_name: source.name.clone(),
                            source_url: source.url.clone(),
                        },
                        programs,
                    })
                }
            }
        };

        loaded.insert(source.id.clone(), Some(feed));
        result
    }

    /// Suggestions from every enabled source, reusing feeds already loaded
    async fn collect_suggestions(
        &self,
        request: &SearchRequest,
        loaded: &mut LoadedFeeds,
    ) -> Vec<String> {
        let mut names = Vec::new();

        for source in self.registry.enabled_by_priority() {
            if !loaded.contains_key(&source.id) {
                let feed = match self.loader.load(source).await {
                    Ok(feed) => Some(feed),
                    Err(e) => {
                        debug!(
                            "No suggestions from source '{}': {}",
                            source.id,
                            e.summary()
                        );
                        None
                    }
                };
                loaded.insert(source.id.clone(), feed);
            }

            if let Some(Some(feed)) = loaded.get(&source.id) {
                names.extend(self.matcher.suggest(&request.channel, &feed.channels));
            }
        }

        self.matcher.aggregate_suggestions(&request.channel, names)
    }

    /// Every configured source with its cache state, in configuration order
    pub async fn source_summaries(&self) -> Vec<SourceSummary> {
        let mut summaries = Vec::with_capacity(self.registry.all().len());
        for source in self.registry.all() {
            let cache = self.loader.cache().status(&source.id).await;
            summaries.push(SourceSummary::new(source, cache));
        }
        summaries
    }

    /// Download a source now and replace its cache entry
    pub async fn refresh_source(&self, source_id: &str) -> AppResult<(SourceConfig, u64)> {
        let source = self
            .registry
            .get(source_id)
            .ok_or_else(|| SourceError::UnknownSource {
                source_id: source_id.to_string(),
            })?;

        let size = self.loader.refresh(source).await?;
        Ok((source.clone(), size))
    }
}

fn success_message(found: &EpgMatch) -> String {
    format!(
        "matched '{}' (score {}), {} programs",
        found.matched.channel_name,
        found.matched.score,
        found.programs.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::errors::SourceResult;
    use crate::sources::FeedCache;
    use crate::utils::http_client::FeedFetcher;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves fixed bodies per URL and records every request
    #[derive(Default)]
    struct StaticFetcher {
        bodies: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> SourceResult<Bytes> {
            self.requests.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url)
                .map(|body| Bytes::from(body.clone()))
                .ok_or_else(|| SourceError::Http {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn feed_with(channel_id: &str, name: &str, programme_day: &str) -> String {
        format!(
            r#"<tv>
  <channel id="{channel_id}"><display-name>{name}</display-name></channel>
  <programme start="{programme_day}180000 +0800" stop="{programme_day}190000 +0800" channel="{channel_id}">
    <title>News</title>
  </programme>
</tv>"#
        )
    }

    fn source(id: &str, priority: u32) -> SourceConfig {
        SourceConfig::new(id, id.to_uppercase(), format!("http://{id}.example/e.xml"), priority)
    }

    fn service(
        sources: Vec<SourceConfig>,
        fetcher: StaticFetcher,
    ) -> (EpgSearchService, Arc<StaticFetcher>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(fetcher);
        let loader = FeedLoader::new(
            fetcher.clone(),
            FeedCache::new(dir.path(), Duration::from_secs(3600)),
        );
        let service = EpgSearchService::new(
            Arc::new(SourceRegistry::new(sources)),
            loader,
            ChannelMatcher::new(&SearchConfig::default()),
        );
        (service, fetcher, dir)
    }

    fn request(channel: &str, source: Option<&str>, max_retry: usize) -> SearchRequest {
        SearchRequest {
            channel: channel.to_string(),
            date: "2024-01-15".to_string(),
            source: source.map(str::to_string),
            max_retry,
        }
    }

    #[tokio::test]
    async fn test_first_success_stops_search() {
        let fetcher = StaticFetcher::default()
            .with("http://a.example/e.xml", &feed_with("1", "CCTV-1", "20240115"))
            .with("http://b.example/e.xml", &feed_with("1", "CCTV-1", "20240115"));
        let (service, fetcher, _dir) = service(vec![source("a", 1), source("b", 2)], fetcher);

        let outcome = service.search(&request("CCTV1", None, 3)).await;
        let SearchOutcome::Found { found, tried_sources } = outcome else {
            panic!("expected a match");
        };
        assert_eq!(found.matched.source_id, "a");
        assert_eq!(found.matched.score, 100);
        assert_eq!(found.programs.len(), 1);
        assert_eq!(tried_sources.len(), 1);
        assert_eq!(fetcher.requests(), vec!["http://a.example/e.xml"]);
    }

    #[tokio::test]
    async fn test_falls_back_past_failing_sources() {
        let fetcher = StaticFetcher::default()
            .with("http://b.example/e.xml", &feed_with("9", "湖南卫视", "20240114"))
            .with("http://c.example/e.xml", &feed_with("hn", "湖南卫视", "20240115"));
        let (service, _fetcher, _dir) =
            service(vec![source("a", 1), source("b", 2), source("c", 3)], fetcher);

        let outcome = service.search(&request("湖南卫视", None, 3)).await;
        let SearchOutcome::Found { found, tried_sources } = outcome else {
            panic!("expected a match");
        };
        assert_eq!(found.matched.source_id, "c");
        assert_eq!(found.matched.channel_id, "hn");

        let entries = tried_sources.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "HTTP status 404");
        assert!(entries[1].message.contains("no programs"));
        assert!(entries[2].success);
    }

    #[tokio::test]
    async fn test_max_retry_bounds_attempts() {
        let (service, fetcher, _dir) = service(
            vec![source("a", 1), source("b", 2), source("c", 3)],
            StaticFetcher::default(),
        );

        let outcome = service.search(&request("CCTV1", None, 2)).await;
        assert!(matches!(outcome, SearchOutcome::NotFound { .. }));
        assert_eq!(outcome.tried_sources().len(), 2);
        // The third source is still consulted for suggestions
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_source_skipped_after_failure() {
        let fetcher = StaticFetcher::default()
            .with("http://b.example/e.xml", &feed_with("1", "CCTV-1", "20240115"));
        let (service, _fetcher, _dir) = service(
            vec![
                source("a", 1),
                source("b", 2).with_retry_on_not_found(false),
            ],
            fetcher,
        );

        let outcome = service.search(&request("CCTV1", None, 3)).await;
        let SearchOutcome::NotFound {
            suggestions,
            tried_sources,
        } = outcome
        else {
            panic!("expected no match");
        };
        assert_eq!(tried_sources.len(), 1);
        assert_eq!(tried_sources.entries()[0].source, "a");
        assert_eq!(suggestions, vec!["CCTV-1"]);
    }

    #[tokio::test]
    async fn test_explicit_source() {
        let fetcher = StaticFetcher::default()
            .with("http://a.example/e.xml", &feed_with("1", "CCTV-1", "20240115"))
            .with("http://b.example/e.xml", &feed_with("5", "CCTV-5", "20240115"));
        let (service, fetcher, _dir) = service(vec![source("a", 1), source("b", 2)], fetcher);

        let outcome = service.search(&request("CCTV1", Some("b"), 3)).await;
        let SearchOutcome::NotFound {
            suggestions,
            tried_sources,
        } = outcome
        else {
            panic!("expected no match");
        };
        assert_eq!(tried_sources.len(), 1);
        assert_eq!(tried_sources.entries()[0].source, "b");
        // CCTV-5 only scores 30 against CCTV1
        assert!(suggestions.is_empty());
        assert_eq!(fetcher.requests(), vec!["http://b.example/e.xml"]);
    }

    #[tokio::test]
    async fn test_unknown_source_falls_back_to_all() {
        let fetcher = StaticFetcher::default()
            .with("http://a.example/e.xml", &feed_with("1", "CCTV-1", "20240115"));
        let (service, _fetcher, _dir) = service(vec![source("a", 1)], fetcher);

        let outcome = service.search(&request("CCTV1", Some("nope"), 3)).await;
        assert!(matches!(outcome, SearchOutcome::Found { .. }));
    }

    #[tokio::test]
    async fn test_refresh_unknown_source() {
        let (service, _fetcher, _dir) = service(vec![source("a", 1)], StaticFetcher::default());
        let err = service.refresh_source("zzz").await.unwrap_err();
        assert_eq!(err.code(), 404);

        let err = service.refresh_source("a").await.unwrap_err();
        assert_eq!(err.code(), 500);
    }

    #[tokio::test]
    async fn test_source_summaries_report_cache() {
        let fetcher = StaticFetcher::default()
            .with("http://a.example/e.xml", &feed_with("1", "CCTV-1", "20240115"));
        let (service, _fetcher, _dir) =
            service(vec![source("a", 1), source("b", 2).with_enabled(false)], fetcher);

        let (refreshed, size) = service.refresh_source("a").await.unwrap();
        assert_eq!(refreshed.id, "a");
        assert!(size > 0);

        let summaries = service.source_summaries().await;
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].cache.fresh);
        assert!(!summaries[1].enabled);
        assert!(!summaries[1].cache.cached);
    }
}
