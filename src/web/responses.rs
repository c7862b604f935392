//! JSON response envelopes
//!
//! Every body carries a numeric `code` and a `message`; the HTTP status of the
//! response always mirrors `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::errors::AppError;
use crate::models::{ProgramRecord, SourceConfig, SourceSummary, TriedSourceLog};
use crate::services::EpgMatch;

/// Serialize `body` with the HTTP status matching its `code`
fn envelope<T: Serialize>(code: u16, body: T) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        envelope(self.code, self)
    }
}

/// Successful lookup
#[derive(Debug, Clone, Serialize)]
pub struct EpgResponse {
    pub code: u16,
    pub message: String,
    pub channel_name: String,
    pub channel_id: String,
    pub icon: Option<String>,
    pub match_score: u8,
    pub date: String,
    pub source: String,
    pub source_name: String,
    pub source_url: String,
    pub programs: Vec<ProgramRecord>,
    pub tried_sources: TriedSourceLog,
}

impl EpgResponse {
    pub fn new(date: &str, found: EpgMatch, tried_sources: TriedSourceLog) -> Self {
        let EpgMatch { matched, programs } = found;
        Self {
            code: 200,
            message: format!("Found {} programs", programs.len()),
            channel_name: matched.channel_name,
            channel_id: matched.channel_id,
            icon: matched.icon,
            match_score: matched.score,
            date: date.to_string(),
            source: matched.source_id,
            source_name: matched.source_name,
            source_url: matched.source_url,
            programs,
            tried_sources,
        }
    }
}

impl IntoResponse for EpgResponse {
    fn into_response(self) -> Response {
        envelope(self.code, self)
    }
}

/// Lookup that no source could satisfy
#[derive(Debug, Clone, Serialize)]
pub struct EpgNotFoundResponse {
    pub code: u16,
    pub message: String,
    pub channel: String,
    pub date: String,
    pub suggestions: Vec<String>,
    pub tried_sources: TriedSourceLog,
}

impl EpgNotFoundResponse {
    pub fn new(
        channel: &str,
        date: &str,
        suggestions: Vec<String>,
        tried_sources: TriedSourceLog,
    ) -> Self {
        Self {
            code: 404,
            message: format!("No EPG data found for '{channel}' on {date}"),
            channel: channel.to_string(),
            date: date.to_string(),
            suggestions,
            tried_sources,
        }
    }
}

impl IntoResponse for EpgNotFoundResponse {
    fn into_response(self) -> Response {
        envelope(self.code, self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcesResponse {
    pub code: u16,
    pub message: String,
    pub sources: Vec<SourceSummary>,
}

impl SourcesResponse {
    pub fn new(sources: Vec<SourceSummary>) -> Self {
        Self {
            code: 200,
            message: format!("{} sources configured", sources.len()),
            sources,
        }
    }
}

impl IntoResponse for SourcesResponse {
    fn into_response(self) -> Response {
        envelope(self.code, self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub code: u16,
    pub message: String,
    pub source: String,
    pub size_bytes: u64,
}

impl UpdateResponse {
    pub fn new(source: &SourceConfig, size_bytes: u64) -> Self {
        Self {
            code: 200,
            message: format!("Cache for '{}' refreshed", source.name),
            source: source.id.clone(),
            size_bytes,
        }
    }
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        envelope(self.code, self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HelpResponse {
    pub code: u16,
    pub message: String,
    pub usage: serde_json::Value,
}

impl HelpResponse {
    pub fn new(default_max_retry: usize) -> Self {
        Self {
            code: 200,
            message: "EPG lookup service".to_string(),
            usage: json!({
                "endpoint": "GET / or GET /epg",
                "parameters": {
                    "ch": "channel name (required for action=epg)",
                    "date": "YYYY-MM-DD (required for action=epg)",
                    "source": "source id to search exclusively; unknown ids search all sources",
                    "max_retry": format!("unsuccessful sources tried before giving up (default {default_max_retry})"),
                    "action": "epg (default), sources, update, help",
                },
                "actions": {
                    "epg": "look up a channel's programmes for one day",
                    "sources": "list configured sources with cache status",
                    "update": "re-download one source now (requires source)",
                    "help": "this description",
                },
                "example": "/?ch=CCTV1&date=2024-01-15",
            }),
        }
    }
}

impl IntoResponse for HelpResponse {
    fn into_response(self) -> Response {
        envelope(self.code, self)
    }
}

/// Liveness payload for `/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub sources: usize,
}

impl HealthResponse {
    pub fn healthy(sources: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            sources,
        }
    }
}

/// Convert AppError to its JSON envelope
///
/// Server-side failures are logged in full; the client only sees the public
/// message.
pub fn handle_error(error: AppError) -> Response {
    let code = error.code();
    if code >= 500 {
        error!("Request failed: {}", error);
    }

    ErrorResponse {
        code,
        message: error.public_message(),
    }
    .into_response()
}
