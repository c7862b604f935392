//! On-disk feed cache
//!
//! One decompressed feed body per source, stored as `<encoded id>.xml` in the
//! configured directory (see [`encode_source_id`]). Freshness is judged from the file's modification time
//! against a fixed TTL. Writes replace the whole file through a temporary file
//! and a rename, so readers never observe a partially written feed; concurrent
//! writers for the same source simply race and the last rename wins.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::{SourceError, SourceResult};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache state of one source, reported by the `sources` action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub cached: bool,
    pub fresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<u64>,
    /// RFC 3339 timestamp of the last write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeedCache {
    directory: PathBuf,
    ttl: Duration,
}

impl FeedCache {
    pub fn new<P: Into<PathBuf>>(directory: P, ttl: Duration) -> Self {
        Self {
            directory: directory.into(),
            ttl,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cache file location for a source
    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.directory
            .join(format!("{}.xml", encode_source_id(source_id)))
    }

    pub async fn ensure_directory(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.directory).await
    }

    /// Cached body if it exists and is younger than the TTL
    ///
    /// Read failures are logged and treated as a cache miss.
    pub async fn read_fresh(&self, source_id: &str) -> Option<Bytes> {
        let path = self.path_for(source_id);
        let metadata = fs::metadata(&path).await.ok()?;
        let age = file_age(&metadata)?;
        if age >= self.ttl {
            debug!(
                "Cache for source '{}' is stale ({}s old, ttl {}s)",
                source_id,
                age.as_secs(),
                self.ttl.as_secs()
            );
            return None;
        }

        match fs::read(&path).await {
            Ok(data) => {
                debug!(
                    "Using cached feed for source '{}' ({} bytes, {}s old)",
                    source_id,
                    data.len(),
                    age.as_secs()
                );
                Some(Bytes::from(data))
            }
            Err(e) => {
                warn!("Failed to read cache for source '{}': {}", source_id, e);
                None
            }
        }
    }

    /// Replace the cached body for a source
    pub async fn write(&self, source_id: &str, data: &[u8]) -> SourceResult<()> {
        let cache_error = |e: std::io::Error| SourceError::cache(source_id, e.to_string());

        self.ensure_directory().await.map_err(cache_error)?;

        let target = self.path_for(source_id);
        let temp = self.directory.join(format!(
            ".{}.{}.{}.tmp",
            encode_source_id(source_id),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = fs::write(&temp, data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(cache_error(e));
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(cache_error(e));
        }

        debug!("Cached {} bytes for source '{}'", data.len(), source_id);
        Ok(())
    }

    pub async fn status(&self, source_id: &str) -> CacheStatus {
        let Ok(metadata) = fs::metadata(self.path_for(source_id)).await else {
            return CacheStatus::default();
        };

        let age = file_age(&metadata);
        let updated_at = metadata
            .modified()
            .ok()
            .map(|modified| DateTime::<Utc>::from(modified).to_rfc3339());

        CacheStatus {
            cached: true,
            fresh: age.is_some_and(|age| age < self.ttl),
            size_bytes: Some(metadata.len()),
            age_secs: age.map(|age| age.as_secs()),
            updated_at,
        }
    }
}

/// Time since last modification; a timestamp in the future counts as zero
fn file_age(metadata: &std::fs::Metadata) -> Option<Duration> {
    let modified = metadata.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

/// File name stem for a source id
///
/// `[A-Za-z0-9_-]` is kept as-is and every other byte becomes `%XX`, so the
/// result is always a plain file name and distinct ids never share a file.
/// The empty id maps to a lone `%`, which no non-empty id can produce.
pub fn encode_source_id(source_id: &str) -> String {
    if source_id.is_empty() {
        return "%".to_string();
    }

    let mut encoded = String::with_capacity(source_id.len());
    for byte in source_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}
