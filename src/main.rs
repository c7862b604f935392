use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_lookup::{
    config::Config,
    services::{ChannelMatcher, EpgSearchService},
    sources::{FeedCache, FeedLoader, SourceRegistry},
    utils::{url::obfuscate_credentials, HttpFeedFetcher},
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "epg-lookup")]
#[command(version)]
#[command(about = "EPG lookup service with fuzzy channel matching across XMLTV feeds")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Feed cache directory (overrides config file)
    #[arg(short = 'd', long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("epg_lookup={},tower_http=trace", cli.log_level)
    } else {
        format!("epg_lookup={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPG Lookup Service v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(cache_dir) = cli.cache_dir {
        config.cache.directory = cache_dir;
    }

    config.validate()?;

    let registry = Arc::new(SourceRegistry::new(config.sources.clone()));
    for source in registry.enabled_by_priority() {
        info!(
            "Source '{}' ({}) priority {}: {}",
            source.id,
            source.name,
            source.priority,
            obfuscate_credentials(&source.url)
        );
    }
    if registry.enabled_count() == 0 {
        warn!("No enabled sources configured, every lookup will return 404");
    }

    let cache = FeedCache::new(config.cache.directory.clone(), config.cache.ttl());
    if let Err(e) = cache.ensure_directory().await {
        warn!(
            "Cannot create cache directory {}: {}",
            cache.directory().display(),
            e
        );
    }
    info!(
        "Feed cache at {} (ttl {}s)",
        cache.directory().display(),
        config.cache.ttl
    );

    let fetcher = Arc::new(HttpFeedFetcher::new(&config.fetch)?);
    let loader = FeedLoader::new(fetcher, cache);
    let search = EpgSearchService::new(registry, loader, ChannelMatcher::new(&config.search));

    let web_server = WebServer::new(config, search)?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
