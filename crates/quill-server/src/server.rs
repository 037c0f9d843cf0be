// crates/quill-server/src/server.rs
// ============================================================================
// Module: Quill Blog Server
// Description: Server assembly, routing, and the HTTP listener.
// Purpose: Mount the legacy post endpoints over the blog service.
// Dependencies: quill-config, quill-core, quill-store-sqlite, axum, tokio, tower-http
// ============================================================================

//! ## Overview
//! [`BlogServer`] turns a validated [`QuillConfig`] into an axum [`Router`].
//! Every legacy endpoint is mounted under `server.route_prefix` and shares one
//! [`BlogService`]. Stored images are served under `/{uploads.public_prefix}`
//! when `uploads.serve` is set. Request bodies are capped at
//! `server.max_body_bytes` and CORS follows `server.cors_allowed_origins`.
//! Responses without a content type, CORS preflights included, are labeled
//! `application/json`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use axum::routing::any;
use quill_config::QuillConfig;
use quill_config::ServerAuditConfig;
use quill_config::ServerConfig;
use quill_config::StoreType;
use quill_core::BlogService;
use quill_core::InMemoryPostStore;
use quill_core::SharedClock;
use quill_core::SharedImageStore;
use quill_core::SharedPostStore;
use quill_store_sqlite::SqlitePostStore;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::QuillAuditSink;
use crate::audit::StderrAuditSink;
use crate::endpoints;
use crate::telemetry::NoopMetrics;
use crate::telemetry::QuillEndpoint;
use crate::telemetry::QuillMetrics;
use crate::uploads::FsImageStore;
use crate::uploads::SystemClock;

// ============================================================================
// SECTION: Blog Server
// ============================================================================

/// HTTP server instance.
pub struct BlogServer {
    /// Validated configuration.
    config: QuillConfig,
    /// Post lifecycle service shared by every endpoint.
    service: BlogService,
    /// Audit sink for request and diagnostic events.
    audit: Arc<dyn QuillAuditSink>,
    /// Metrics sink for request counters and latencies.
    metrics: Arc<dyn QuillMetrics>,
    /// CORS policy derived from configuration.
    cors: CorsLayer,
}

impl BlogServer {
    /// Builds a server from configuration, opening the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration is invalid or a backend
    /// cannot be opened.
    pub fn from_config(config: QuillConfig) -> Result<Self, ServerError> {
        let service = build_service(&config)?;
        Self::with_service(config, service)
    }

    /// Builds a server around an existing service.
    ///
    /// The service's own tunables are used as-is; `config` only drives the
    /// HTTP surface (routing, limits, CORS, audit, static uploads).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration is invalid or the audit
    /// log cannot be opened.
    pub fn with_service(config: QuillConfig, service: BlogService) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        ensure_routes_disjoint(&config)?;
        let cors = build_cors(&config.server)?;
        let audit = build_audit_sink(&config.server.audit)?;
        Ok(Self {
            config,
            service,
            audit,
            metrics: Arc::new(NoopMetrics),
            cors,
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn QuillAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn QuillMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &QuillConfig {
        &self.config
    }

    /// Builds the axum router for every endpoint.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = Arc::new(ServerState {
            service: self.service.clone(),
            audit: Arc::clone(&self.audit),
            metrics: Arc::clone(&self.metrics),
        });
        let base = self.config.server.route_base();
        let mut routes: Router<Arc<ServerState>> = Router::new();
        for endpoint in QuillEndpoint::ALL {
            let path = format!("{base}/{}", endpoint.file_name());
            routes = routes.route(
                &path,
                any(move |State(state): State<Arc<ServerState>>, request: Request| {
                    endpoints::dispatch(state, endpoint, request)
                }),
            );
        }
        let mut app = routes.with_state(state);
        if self.config.uploads.serve {
            let mount = format!("/{}", self.config.uploads.public_prefix);
            app = app.nest_service(&mount, ServeDir::new(&self.config.uploads.dir));
        }
        app.layer(DefaultBodyLimit::max(self.config.server.max_body_bytes))
            .layer(self.cors.clone())
            .layer(SetResponseHeaderLayer::if_not_present(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ))
    }

    /// Binds `server.bind` and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Shared server state for endpoint handlers.
pub(crate) struct ServerState {
    /// Post lifecycle service.
    pub(crate) service: BlogService,
    /// Audit sink.
    pub(crate) audit: Arc<dyn QuillAuditSink>,
    /// Metrics sink.
    pub(crate) metrics: Arc<dyn QuillMetrics>,
}

// ============================================================================
// SECTION: Assembly Helpers
// ============================================================================

/// Builds the blog service over the configured store, the uploads directory,
/// and the system clock.
///
/// # Errors
///
/// Returns [`ServerError`] when the configuration is invalid or the store
/// cannot be opened.
pub fn build_service(config: &QuillConfig) -> Result<BlogService, ServerError> {
    config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
    let posts = build_post_store(config)?;
    let images = SharedImageStore::from_store(FsImageStore::new(
        config.uploads.dir.clone(),
        config.uploads.public_prefix.clone(),
    ));
    let clock = SharedClock::from_clock(SystemClock);
    Ok(BlogService::new(posts, images, clock, config.service_config()))
}

/// Builds the post store from configuration.
fn build_post_store(config: &QuillConfig) -> Result<SharedPostStore, ServerError> {
    let store = match config.store.store_type {
        StoreType::Memory => SharedPostStore::from_store(InMemoryPostStore::new()),
        StoreType::Sqlite => {
            let sqlite_config = config
                .store
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store = SqlitePostStore::new(&sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedPostStore::from_store(store)
        }
    };
    Ok(store)
}

/// Rejects layouts where the static uploads mount and an endpoint route
/// overlap in either direction.
fn ensure_routes_disjoint(config: &QuillConfig) -> Result<(), ServerError> {
    if !config.uploads.serve {
        return Ok(());
    }
    let mount = format!("/{}", config.uploads.public_prefix);
    let base = config.server.route_base();
    if base == mount || base.starts_with(&format!("{mount}/")) {
        return Err(ServerError::Config(
            "server.route_prefix must not be inside the uploads mount".to_string(),
        ));
    }
    if let Some(endpoint) = QuillEndpoint::ALL
        .into_iter()
        .find(|endpoint| format!("{base}/{}", endpoint.file_name()) == mount)
    {
        return Err(ServerError::Config(format!(
            "uploads.public_prefix must not shadow the {} endpoint",
            endpoint.file_name()
        )));
    }
    Ok(())
}

/// Builds the CORS policy.
fn build_cors(server: &ServerConfig) -> Result<CorsLayer, ServerError> {
    let origin = if server.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins = server
            .cors_allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ServerError::Config(format!("invalid cors origin: {origin}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]))
}

/// Builds the audit sink selected by `[server.audit]`.
fn build_audit_sink(audit: &ServerAuditConfig) -> Result<Arc<dyn QuillAuditSink>, ServerError> {
    if !audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &audit.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Blog server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
