//! Web layer module
//!
//! HTTP interface of the EPG lookup service. Handlers are thin: they validate
//! query parameters, call the search service and wrap the outcome in a JSON
//! envelope whose HTTP status mirrors its `code`.
//!
//! # Routes
//!
//! - `GET /` and `GET /epg`: lookup endpoint (see [`extractors::Action`])
//! - `GET /health`: liveness

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{config::Config, services::EpgSearchService};

pub mod extractors;
pub mod handlers;
pub mod responses;

pub use responses::handle_error;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, search: EpgSearchService) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = create_router(AppState {
            config: Arc::new(config),
            search: Arc::new(search),
        });

        Ok(Self { app, addr })
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub search: Arc<EpgSearchService>,
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::epg::epg_lookup))
        .route("/epg", get(handlers::epg::epg_lookup))
        .route("/health", get(handlers::health::health_check))
        // Middleware (applied in reverse order)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
