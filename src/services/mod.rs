//! Lookup services
//!
//! - `channel_matcher`: exact and fuzzy channel resolution, suggestions
//! - `program_extractor`: one channel's programmes for one day
//! - `epg_search`: priority-ordered search across sources

pub mod channel_matcher;
pub mod epg_search;
pub mod program_extractor;

pub use channel_matcher::{ChannelMatch, ChannelMatcher};
pub use epg_search::{EpgMatch, EpgSearchService, SearchOutcome, SearchRequest};
pub use program_extractor::extract_programs;
