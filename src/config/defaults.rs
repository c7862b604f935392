/// Configuration default values
///
/// All defaults for configuration options live here so they can be changed
/// in one place.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Cache defaults
pub const DEFAULT_CACHE_DIRECTORY: &str = "./data/epg-cache";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 6 * 3600;

// Fetch defaults
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_USER_AGENT: &str = concat!("epg-lookup/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_ACCEPT_INVALID_CERTS: bool = false;

// Search defaults
pub const DEFAULT_MAX_RETRY: usize = 3;
pub const DEFAULT_MATCH_THRESHOLD: u8 = 65;
pub const DEFAULT_SUGGESTION_THRESHOLD: u8 = 50;
pub const DEFAULT_PER_SOURCE_SUGGESTIONS: usize = 10;
pub const DEFAULT_AGGREGATED_SUGGESTIONS: usize = 15;

// Bundled feeds
pub const DEFAULT_SOURCES: [(&str, &str, &str); 3] = [
    ("epg_pw", "EPG.PW", "https://epg.pw/xmltv/epg_CN.xml.gz"),
    ("112114", "112114 EPG", "https://epg.112114.xyz/pp.xml.gz"),
    ("erw", "EPG ERW", "https://e.erw.cc/all.xml.gz"),
];
