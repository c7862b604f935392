//! Request parameters and validation
//!
//! Query parameters are taken as plain optional strings so that malformed
//! values reach the handler and get the service's own 400 envelope instead of
//! an extractor rejection.

use regex::Regex;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::errors::{AppError, AppResult};
use crate::services::SearchRequest;

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$")
            .expect("static date pattern is valid")
    })
}

/// Raw query string of the lookup endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpgQueryParams {
    pub ch: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
    pub max_retry: Option<String>,
    pub action: Option<String>,
}

/// Operation selected by the `action` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Epg,
    Sources,
    Update,
    Help,
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "epg" => Ok(Self::Epg),
            "sources" => Ok(Self::Sources),
            "update" => Ok(Self::Update),
            "help" => Ok(Self::Help),
            other => Err(AppError::validation(format!(
                "Unknown action '{other}', expected one of: epg, sources, update, help"
            ))),
        }
    }
}

/// A lookup request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgRequest {
    pub channel: String,
    pub date: String,
    pub source: Option<String>,
    pub max_retry: usize,
}

impl EpgQueryParams {
    pub fn action(&self) -> AppResult<Action> {
        self.action.as_deref().map_or(Ok(Action::Epg), str::parse::<Action>)
    }

    /// Trimmed `source`, if present and non-empty
    pub fn source_id(&self) -> Option<&str> {
        non_empty(self.source.as_deref())
    }

    /// Validate the lookup parameters
    ///
    /// The date is checked for shape only: `2024-02-30` is accepted and simply
    /// finds no programmes. An absent or unreadable `max_retry` uses the
    /// configured default, and zero is raised to one.
    pub fn epg_request(&self, default_max_retry: usize) -> AppResult<EpgRequest> {
        let channel = non_empty(self.ch.as_deref())
            .ok_or_else(|| AppError::validation("Missing required parameter 'ch'"))?;

        let date = non_empty(self.date.as_deref())
            .ok_or_else(|| AppError::validation("Missing required parameter 'date'"))?;
        if !date_regex().is_match(date) {
            return Err(AppError::validation(format!(
                "Invalid date '{date}', expected YYYY-MM-DD"
            )));
        }

        let max_retry = self
            .max_retry
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(default_max_retry)
            .max(1);

        Ok(EpgRequest {
            channel: channel.to_string(),
            date: date.to_string(),
            source: self.source_id().map(str::to_string),
            max_retry,
        })
    }
}

impl From<EpgRequest> for SearchRequest {
    fn from(request: EpgRequest) -> Self {
        Self {
            channel: request.channel,
            date: request.date,
            source: request.source,
            max_retry: request.max_retry,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(ch: Option<&str>, date: Option<&str>) -> EpgQueryParams {
        EpgQueryParams {
            ch: ch.map(str::to_string),
            date: date.map(str::to_string),
            ..EpgQueryParams::default()
        }
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(EpgQueryParams::default().action().unwrap(), Action::Epg);
        assert_eq!("".parse::<Action>().unwrap(), Action::Epg);
        assert_eq!("Sources".parse::<Action>().unwrap(), Action::Sources);
        assert_eq!("update".parse::<Action>().unwrap(), Action::Update);
        assert_eq!("help".parse::<Action>().unwrap(), Action::Help);
        assert_eq!("purge".parse::<Action>().unwrap_err().code(), 400);
    }

    #[test]
    fn test_valid_request() {
        let request = params(Some(" CCTV1 "), Some("2024-01-15"))
            .epg_request(3)
            .unwrap();
        assert_eq!(request.channel, "CCTV1");
        assert_eq!(request.date, "2024-01-15");
        assert_eq!(request.source, None);
        assert_eq!(request.max_retry, 3);
    }

    #[test]
    fn test_missing_parameters() {
        let err = params(None, Some("2024-01-15")).epg_request(3).unwrap_err();
        assert!(err.public_message().contains("'ch'"));
        let err = params(Some("   "), Some("2024-01-15")).epg_request(3).unwrap_err();
        assert_eq!(err.code(), 400);
        let err = params(Some("CCTV1"), None).epg_request(3).unwrap_err();
        assert!(err.public_message().contains("'date'"));
    }

    #[test]
    fn test_date_format() {
        for bad in [
            "2024-13-40", "2024-1-15", "20240115", "2024-00-10", "2024-01-32", "2024-01-15x",
            "２０２４-01-15", "2024-01-١٥",
        ] {
            assert!(
                params(Some("CCTV1"), Some(bad)).epg_request(3).is_err(),
                "{bad} should be rejected"
            );
        }
        // Shape is valid, the calendar day is not; accepted on purpose
        assert!(params(Some("CCTV1"), Some("2024-02-30")).epg_request(3).is_ok());
    }

    #[test]
    fn test_max_retry() {
        let mut p = params(Some("CCTV1"), Some("2024-01-15"));
        for (raw, expected) in [("5", 5), ("0", 1), ("abc", 3), ("-2", 3), (" 2 ", 2)] {
            p.max_retry = Some(raw.to_string());
            assert_eq!(p.epg_request(3).unwrap().max_retry, expected, "max_retry={raw}");
        }
    }

    #[test]
    fn test_source_is_trimmed() {
        let mut p = params(Some("CCTV1"), Some("2024-01-15"));
        p.source = Some("  ".to_string());
        assert_eq!(p.epg_request(3).unwrap().source, None);
        p.source = Some(" epg_pw ".to_string());
        let search: SearchRequest = p.epg_request(3).unwrap().into();
        assert_eq!(search.source.as_deref(), Some("epg_pw"));
    }
}
