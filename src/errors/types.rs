//! Error type definitions for the EPG lookup service
//!
//! Errors are split by layer: [`AppError`] is what handlers and explicit
//! operations return, [`SourceError`] describes a single feed source failing
//! to fetch, decompress, cache or parse. Source errors raised during a search
//! never escape the search loop; they are recorded in the tried-source log.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing request input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Source failures surfaced by explicit operations (e.g. forced refresh)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Feed source specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport level failure (connect, timeout, TLS, body read)
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },

    /// Non-success HTTP status from the feed host
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Body could not be decompressed
    #[error("Decompression failed: {message}")]
    Decompress { message: String },

    /// Feed body is not a usable XMLTV document
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Cache read or write failure
    #[error("Cache error: {source_id} - {message}")]
    Cache { source_id: String, message: String },

    /// Source id is not configured
    #[error("Unknown source: {source_id}")]
    UnknownSource { source_id: String },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// HTTP-style status code carried in the JSON envelope
    pub fn code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Source(SourceError::UnknownSource { .. }) => 404,
            Self::Configuration { .. } | Self::Source(_) => 500,
        }
    }

    /// Message that is safe to hand to a client.
    ///
    /// Filesystem and cache details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Configuration { .. } => "Service is misconfigured".to_string(),
            Self::Source(SourceError::Cache { .. }) => "Cache unavailable".to_string(),
            Self::Source(SourceError::UnknownSource { source_id }) => {
                format!("Unknown source '{source_id}'")
            }
            Self::Source(e) => format!("Source operation failed: {}", e.summary()),
        }
    }
}

impl SourceError {
    /// Create a fetch error
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decompression error
    pub fn decompress<M: Into<String>>(message: M) -> Self {
        Self::Decompress {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a cache error
    pub fn cache<S: Into<String>, M: Into<String>>(source_id: S, message: M) -> Self {
        Self::Cache {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Short description for the tried-source log, without URLs or paths
    pub fn summary(&self) -> String {
        match self {
            Self::Fetch { message, .. } => format!("fetch failed: {message}"),
            Self::Http { status, .. } => format!("HTTP status {status}"),
            Self::Decompress { message } => format!("decompression failed: {message}"),
            Self::Parse { message } => format!("parse failed: {message}"),
            Self::Cache { .. } => "cache unavailable".to_string(),
            Self::UnknownSource { source_id } => format!("unknown source {source_id}"),
        }
    }
}
