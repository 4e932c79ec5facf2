//! Viewer server
//!
//! Serves the race card page with server-side rendering. Every request
//! resolves a fresh manifest; nothing is cached between requests.
//!
//! ```text
//!   GET  /                        race card page (?raceId=...)
//!   GET  /fragments/{id}.html     single race card, for in-place navigation
//!   GET  /api/races               resolved manifest as JSON
//!   POST /api/selection           apply a picker change to a query string
//!   GET  /api/health              health check
//!   GET  /metrics                 Prometheus metrics
//!   GET  /*                       static files from the public directory
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use racecard::config::Config;
//! use racecard::server::ViewerServer;
//!
//! let server = ViewerServer::new(Config::default())?;
//! server.start().await?;
//! ```

pub mod api;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::render::PageRenderer;
use crate::resolver::ManifestResolver;

use api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
///
/// Everything here is immutable; per-request state lives in the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Manifest resolver
    pub resolver: ManifestResolver,

    /// Page renderer
    pub renderer: Arc<PageRenderer>,

    /// Query parameter carrying the selected race
    pub query_param: String,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Viewer Server
// ============================================================================

/// Main viewer server
pub struct ViewerServer {
    config: Config,
    state: AppState,
}

impl ViewerServer {
    /// Create a new viewer server
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let resolver = ManifestResolver::from_config(&config)
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let renderer = PageRenderer::new(config.site.clone())
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState {
            resolver,
            renderer: Arc::new(renderer),
            query_param: config.selection.query_param.clone(),
            start_time: Instant::now(),
        };

        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let public_dir: PathBuf = self.config.source.public_dir.clone();
        let mut router = create_router(self.state.clone()).fallback_service(ServeDir::new(public_dir));

        // Add CORS layer if enabled
        if self.config.server.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if self.config.server.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.server.bind_address;

        tracing::info!(%addr, "Starting viewer server");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Viewer server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.server.bind_address,
            candidates: self
                .state
                .resolver
                .candidates()
                .iter()
                .map(|c| c.location.clone())
                .collect(),
            public_dir: self.config.source.public_dir.clone(),
            cors_enabled: self.config.server.enable_cors,
            request_logging_enabled: self.config.server.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub candidates: Vec<String>,
    pub public_dir: PathBuf,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Race Card Viewer\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Candidates: {}\n\
             Public Dir: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.candidates.join(", "),
            self.public_dir.display(),
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    BindError(String),

    /// Server error
    #[error("Server error: {0}")]
    ServeError(String),
}

// ============================================================================
// Tests
// ============================================================================
