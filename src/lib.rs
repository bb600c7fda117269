//! API mock sniffer.
//!
//! HTTP middleware for front-end and API development: requests under a
//! configured route are answered from local mock resources when one exists,
//! and forwarded to a real origin otherwise. Everything else passes through
//! to the downstream service untouched.
//!
//! # Embedding
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{middleware, Router};
//! use api_mock_sniffer::{sniff, Dispatcher, SnifferConfig};
//!
//! # fn build() -> Result<Router, api_mock_sniffer::ConfigError> {
//! let config = SnifferConfig {
//!     remote: "http://localhost:8080".into(),
//!     root: "./apiMock".into(),
//!     ..Default::default()
//! };
//! let dispatcher = Arc::new(Dispatcher::new(config)?);
//! let app = Router::new()
//!     .fallback(|| async { "downstream" })
//!     .layer(middleware::from_fn_with_state(dispatcher, sniff));
//! # Ok(app)
//! # }
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mock;
pub mod observability;
pub mod routing;

pub use config::{ConfigError, SnifferConfig};
pub use http::{sniff, Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::RouteDescriptor;
