use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{SourceError, SourceResult};
use crate::models::SourceConfig;
use crate::sources::feed_cache::FeedCache;
use crate::sources::xmltv::{parse_feed, XmltvFeed};
use crate::utils::decompress_feed;
use crate::utils::http_client::FeedFetcher;
use crate::utils::url::obfuscate_credentials;

/// Produces parsed feeds for sources, going through the cache first
#[derive(Clone)]
pub struct FeedLoader {
    fetcher: Arc<dyn FeedFetcher>,
    cache: FeedCache,
}

impl FeedLoader {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, cache: FeedCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Fresh cache hit, otherwise download and cache, then parse
    ///
    /// A failed cache write only costs the next request a download, so it is
    /// logged and the downloaded body is used anyway.
    pub async fn load(&self, source: &SourceConfig) -> SourceResult<XmltvFeed> {
        let body = match self.cache.read_fresh(&source.id).await {
            Some(body) => body,
            None => {
                let body = self.download(source).await?;
                if let Err(e) = self.cache.write(&source.id, &body).await {
                    warn!("Could not cache feed for source '{}': {}", source.id, e);
                }
                body
            }
        };

        let feed = tokio::task::spawn_blocking(move || parse_feed(&body))
            .await
            .map_err(|e| SourceError::parse(format!("parser task failed: {e}")))??;

        debug!(
            "Source '{}' provides {} channels and {} programmes",
            source.id,
            feed.channels.len(),
            feed.programmes.len()
        );
        Ok(feed)
    }

    /// Download a source and replace its cache entry, returning the stored size
    pub async fn refresh(&self, source: &SourceConfig) -> SourceResult<u64> {
        let body = self.download(source).await?;
        self.cache.write(&source.id, &body).await?;

        info!(
            "Refreshed cache for source '{}' ({} bytes)",
            source.id,
            body.len()
        );
        Ok(body.len() as u64)
    }

    async fn download(&self, source: &SourceConfig) -> SourceResult<Bytes> {
        debug!(
            "Downloading source '{}' from {}",
            source.id,
            obfuscate_credentials(&source.url)
        );
        let raw = self.fetcher.fetch(&source.url).await?;
        Ok(decompress_feed(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFetcher {
        body: &'static [u8],
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> SourceResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.body.is_empty() {
                return Err(SourceError::Http {
                    status: 503,
                    url: url.to_string(),
                });
            }
            Ok(Bytes::from_static(self.body))
        }
    }

    const FEED: &[u8] =
        b"<tv><channel id=\"1\"><display-name>CCTV-1</display-name></channel></tv>";

    fn loader(body: &'static [u8], ttl: Duration) -> (FeedLoader, Arc<CountingFetcher>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            body,
            calls: AtomicUsize::new(0),
        });
        let loader = FeedLoader::new(fetcher.clone(), FeedCache::new(dir.path(), ttl));
        (loader, fetcher, dir)
    }

    #[tokio::test]
    async fn test_load_uses_fresh_cache() {
        let (loader, fetcher, _dir) = loader(FEED, Duration::from_secs(3600));
        let source = SourceConfig::new("a", "A", "http://a.example/e.xml", 1);

        let first = loader.load(&source).await.unwrap();
        let second = loader.load(&source).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.channels[0].name, "CCTV-1");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_is_refetched() {
        let (loader, fetcher, _dir) = loader(FEED, Duration::ZERO);
        let source = SourceConfig::new("a", "A", "http://a.example/e.xml", 1);

        loader.load(&source).await.unwrap();
        loader.load(&source).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let (loader, _fetcher, _dir) = loader(b"", Duration::from_secs(60));
        let source = SourceConfig::new("a", "A", "http://a.example/e.xml", 1);

        assert!(matches!(
            loader.load(&source).await,
            Err(SourceError::Http { status: 503, .. })
        ));
        assert!(loader.refresh(&source).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_writes_cache() {
        let (loader, fetcher, _dir) = loader(FEED, Duration::from_secs(3600));
        let source = SourceConfig::new("a", "A", "http://a.example/e.xml", 1);

        let size = loader.refresh(&source).await.unwrap();
        assert_eq!(size, FEED.len() as u64);
        assert!(loader.cache().status("a").await.fresh);

        loader.load(&source).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
