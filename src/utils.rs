//! Utility modules for the EPG lookup service
//!
//! - `channel_name`: channel name normalization
//! - `channel_similarity`: 0-100 scoring of normalized names
//! - `decompression`: gzip feed bodies
//! - `http_client`: feed downloads
//! - `time`: XMLTV timestamps
//! - `url`: credential masking for logs

pub mod channel_name;
pub mod channel_similarity;
pub mod decompression;
pub mod http_client;
pub mod time;
pub mod url;

pub use channel_name::normalize_channel_name;
pub use channel_similarity::{cctv_number, same_cctv_channel, similarity_score};
pub use decompression::decompress_feed;
pub use http_client::{FeedFetcher, HttpFeedFetcher};
