//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the sniffer in front of a downstream service
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener and shut down gracefully

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{ConfigError, SnifferConfig};
use crate::http::dispatch::{sniff, Dispatcher};

/// Standalone development server running the sniffer.
pub struct HttpServer {
    router: Router,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SnifferConfig) -> Result<Self, ConfigError> {
        let dispatcher = Arc::new(Dispatcher::new(config)?);
        Ok(Self::with_dispatcher(dispatcher))
    }

    /// Serve an already built dispatcher.
    pub fn with_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        let router = Self::build_router(Arc::clone(&dispatcher));
        Self { router, dispatcher }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
        let downstream = match dispatcher.config().server.static_dir.as_deref() {
            Some(dir) => Router::new().fallback_service(ServeDir::new(Path::new(dir))),
            None => Router::new().fallback(not_found),
        };

        downstream
            .layer(middleware::from_fn_with_state(dispatcher, sniff))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Downstream answer when no static directory is configured.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}
