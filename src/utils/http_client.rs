use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{redirect, Client};
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::utils::url::obfuscate_credentials;

/// Downloads raw feed bodies
///
/// The body is returned exactly as served; decompression happens afterwards
/// so that any fetcher, including in-memory ones used by tests, gets the same
/// gzip handling.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> SourceResult<Bytes>;
}

/// reqwest-backed fetcher with bounded timeouts and redirects
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for feed downloads");
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AppError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> SourceResult<Bytes> {
        let safe_url = obfuscate_credentials(url);
        debug!("Fetching feed from {}", safe_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(safe_url.clone(), e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: safe_url,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            SourceError::fetch(
                safe_url.clone(),
                format!("failed to read body: {}", e.without_url()),
            )
        })?;

        debug!("Downloaded {} bytes from {}", body.len(), safe_url);
        Ok(body)
    }
}
