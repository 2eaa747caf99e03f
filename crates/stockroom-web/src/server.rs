//! Web server implementation.
//!
//! Provides health, ready, and metrics endpoints next to the inventory pages.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use stockroom_core::storage::{MemoryBackend, StorageBackend};
use stockroom_core::{Error, Result};
use stockroom_inventory::{CategoryService, InventoryStore, ItemService, Uploads};

use crate::config::{Config, UploadMode};
use crate::error::WebError;

// ============================================================================
// Health and Ready Responses
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// Service readiness status.
    pub ready: bool,
    /// Optional message about readiness state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Category operations.
    pub categories: CategoryService,
    /// Item operations.
    pub items: ItemService,
    store: InventoryStore,
}

impl AppState {
    /// Creates application state over a document backend and upload adapter.
    #[must_use]
    pub fn new(config: Config, documents: Arc<dyn StorageBackend>, uploads: Uploads) -> Self {
        let store = InventoryStore::new(documents);
        Self {
            config,
            categories: CategoryService::new(store.clone()),
            items: ItemService::new(store.clone(), uploads),
            store,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check
/// that doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check endpoint handler.
///
/// Returns 200 OK once the document store answers a listing.
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some(format!("document store check failed: {e}")),
            }),
        ),
    }
}

async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}

// ============================================================================
// Server
// ============================================================================

/// The Stockroom web server.
pub struct Server {
    config: Config,
    documents: Arc<dyn StorageBackend>,
    uploads: Uploads,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("documents", &"<StorageBackend>")
            .field("uploads", &self.uploads)
            .finish()
    }
}

impl Server {
    /// Creates a new server with the given configuration.
    ///
    /// Defaults to in-memory documents and local uploads under the
    /// configured directory.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let uploads = Uploads::local(config.upload_dir.clone());
        Self {
            config,
            documents: Arc::new(MemoryBackend::new()),
            uploads,
        }
    }

    /// Creates a new server with explicit document storage and uploads.
    #[must_use]
    pub fn with_backends(
        config: Config,
        documents: Arc<dyn StorageBackend>,
        uploads: Uploads,
    ) -> Self {
        Self {
            config,
            documents,
            uploads,
        }
    }

    /// Creates a new `ServerBuilder`.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState::new(
            self.config.clone(),
            Arc::clone(&self.documents),
            self.uploads.clone(),
        ));

        let metrics_layer = middleware::from_fn(crate::metrics::metrics_middleware);

        let mut router = Router::new()
            .route("/health", get(health))
            .route("/ready", get(ready))
            .route("/metrics", get(crate::metrics::serve_metrics))
            .merge(crate::routes::inventory_routes());

        if self.config.upload_mode == UploadMode::Local {
            router = router.nest_service("/uploads", ServeDir::new(&self.config.upload_dir));
        }

        router
            .fallback(not_found)
            // Metrics outermost for timing, then trace, then the body limit.
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(metrics_layer)
            .with_state(state)
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the server cannot
    /// bind to the port.
    pub async fn serve(&self) -> Result<()> {
        self.config.validate()?;

        crate::metrics::init_metrics();

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.create_router();

        tracing::info!(
            http_port = self.config.http_port,
            uploads = %self.uploads.describe(),
            "Starting Stockroom web server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// This is useful for integration tests where you want to test
    /// the routes without actually binding to a port.
    #[doc(hidden)]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }
}

/// Builder for constructing a server.
pub struct ServerBuilder {
    config: Config,
    documents: Option<Arc<dyn StorageBackend>>,
    uploads: Option<Uploads>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("documents", &self.documents.as_ref().map(|_| "<StorageBackend>"))
            .field("uploads", &self.uploads)
            .finish()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config: Config {
                debug: true,
                ..Config::default()
            },
            documents: None,
            uploads: None,
        }
    }
}

impl ServerBuilder {
    /// Creates a new server builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP port.
    #[must_use]
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.http_port = port;
        self
    }

    /// Enables debug mode.
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_upload_bytes(mut self, limit: usize) -> Self {
        self.config.max_upload_bytes = limit;
        self
    }

    /// Stores uploads in `dir` and serves them under `/uploads`.
    #[must_use]
    pub fn local_uploads(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        let dir = dir.into();
        self.config.upload_mode = UploadMode::Local;
        self.config.upload_dir.clone_from(&dir);
        self.uploads = Some(Uploads::local(dir));
        self
    }

    /// Stores uploads in `bucket`, published under `public_url`.
    #[must_use]
    pub fn bucket_uploads(
        mut self,
        bucket: Arc<dyn StorageBackend>,
        public_url: impl Into<String>,
    ) -> Self {
        let public_url = public_url.into();
        self.config.upload_mode = UploadMode::Remote;
        self.config.bucket.public_url = Some(public_url.clone());
        self.uploads = Some(Uploads::bucket(bucket, public_url));
        self
    }

    /// Sets the document storage backend.
    ///
    /// By default, the server uses an in-memory backend intended only for tests/dev.
    #[must_use]
    pub fn document_backend(mut self, documents: Arc<dyn StorageBackend>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let uploads = self
            .uploads
            .unwrap_or_else(|| Uploads::local(self.config.upload_dir.clone()));
        let documents = self
            .documents
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        Server::with_backends(self.config, documents, uploads)
    }
}

// ============================================================================
// Tests
// ============================================================================
