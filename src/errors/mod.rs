//! Centralized error handling for the EPG lookup service
//!
//! # Error Categories
//!
//! - **Validation Errors**: malformed `ch`/`date`/`action` input, detected
//!   before any source is touched
//! - **Configuration Errors**: invalid settings detected at startup
//! - **Source Errors**: one feed failing to fetch, decompress, cache or parse,
//!   or an explicit operation naming an unknown source

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
