//! HTTP handlers
//!
//! - `epg`: the lookup endpoint and its alternate actions
//! - `health`: liveness

pub mod epg;
pub mod health;
