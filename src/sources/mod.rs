//! Feed sources
//!
//! Everything between a configured source and a parsed XMLTV document:
//!
//! - `registry`: configured sources in search order
//! - `feed_cache`: per-source on-disk cache with a TTL
//! - `feed_loader`: cache-or-download, decompression and parsing
//! - `xmltv`: streaming XMLTV parser

pub mod feed_cache;
pub mod feed_loader;
pub mod registry;
pub mod xmltv;

pub use feed_cache::{CacheStatus, FeedCache};
pub use feed_loader::FeedLoader;
pub use registry::SourceRegistry;
pub use xmltv::{parse_feed, XmltvFeed, XmltvProgramme};
