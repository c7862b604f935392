use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::models::SourceConfig;
use crate::sources::feed_cache::encode_source_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// One `<source id>.xml` file per source is kept here
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
    /// Freshness window measured from the file's last write
    #[serde(default = "default_cache_ttl")]
    pub ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Skip TLS certificate verification for feed hosts
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_retry")]
    pub default_max_retry: usize,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: u8,
    #[serde(default = "default_suggestion_threshold")]
    pub suggestion_threshold: u8,
    #[serde(default = "default_per_source_suggestions")]
    pub per_source_suggestions: usize,
    #[serde(default = "default_aggregated_suggestions")]
    pub aggregated_suggestions: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIRECTORY)
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_invalid_certs() -> bool {
    DEFAULT_ACCEPT_INVALID_CERTS
}

fn default_max_retry() -> usize {
    DEFAULT_MAX_RETRY
}

fn default_match_threshold() -> u8 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_suggestion_threshold() -> u8 {
    DEFAULT_SUGGESTION_THRESHOLD
}

fn default_per_source_suggestions() -> usize {
    DEFAULT_PER_SOURCE_SUGGESTIONS
}

fn default_aggregated_suggestions() -> usize {
    DEFAULT_AGGREGATED_SUGGESTIONS
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            ttl: default_cache_ttl(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_retry: default_max_retry(),
            match_threshold: default_match_threshold(),
            suggestion_threshold: default_suggestion_threshold(),
            per_source_suggestions: default_per_source_suggestions(),
            aggregated_suggestions: default_aggregated_suggestions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let sources = DEFAULT_SOURCES
            .iter()
            .zip(1u32..)
            .map(|((id, name, url), priority)| SourceConfig::new(*id, *name, *url, priority))
            .collect();

        Self {
            web: WebConfig::default(),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            search: SearchConfig::default(),
            sources,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load the configuration file, writing the defaults out if it does not exist yet
    pub fn load(config_file: &str) -> Result<Self> {
        if Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            info!("Loading configuration from {}", config_file);
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("No configuration found, wrote defaults to {}", config_file);
            Ok(default_config)
        }
    }

    /// Check invariants the search relies on
    pub fn validate(&self) -> AppResult<()> {
        if self.fetch.timeout_secs <= self.fetch.connect_timeout_secs {
            return Err(AppError::configuration(format!(
                "fetch.timeout_secs ({}) must be greater than fetch.connect_timeout_secs ({})",
                self.fetch.timeout_secs, self.fetch.connect_timeout_secs
            )));
        }

        for (name, value) in [
            ("search.match_threshold", self.search.match_threshold),
            ("search.suggestion_threshold", self.search.suggestion_threshold),
        ] {
            if value > 100 {
                return Err(AppError::configuration(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }

        if self.search.default_max_retry == 0 {
            return Err(AppError::configuration(
                "search.default_max_retry must be at least 1",
            ));
        }

        let mut seen = HashSet::new();
        let mut cache_files = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(AppError::configuration("source id must not be empty"));
            }
            if source.url.trim().is_empty() {
                return Err(AppError::configuration(format!(
                    "source '{}' has an empty url",
                    source.id
                )));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(AppError::configuration(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
            // Case-insensitive filesystems fold `CCTV` and `cctv` into one file
            if !cache_files.insert(encode_source_id(&source.id).to_ascii_lowercase()) {
                return Err(AppError::configuration(format!(
                    "source id '{}' differs from another id only by letter case",
                    source.id
                )));
            }
        }

        Ok(())
    }
}
