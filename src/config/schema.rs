//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sniffer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the mock sniffer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Base URL requests are forwarded to when no local mock exists.
    pub remote: String,

    /// Directory holding local mock resources.
    pub root: String,

    /// Which request paths are intercepted.
    pub route: RouteSetting,

    /// Strip the route prefix from paths before resolving them.
    #[serde(alias = "useVirtualRoute")]
    pub use_virtual_route: bool,

    /// Explicit string removed from paths when virtual routing is on.
    /// Required when the route is not a plain prefix.
    #[serde(alias = "virtualPrefix")]
    pub virtual_prefix: Option<String>,

    /// Suppress diagnostic logging from the dispatcher.
    pub silence: bool,

    /// File extension appended to the request path to find a mock resource.
    pub extension: String,

    /// Standalone server settings (ignored when embedded as middleware).
    pub server: ServerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            remote: String::new(),
            root: "./apiMock".to_string(),
            route: RouteSetting::default(),
            use_virtual_route: false,
            virtual_prefix: None,
            silence: false,
            extension: ".js".to_string(),
            server: ServerConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Route setting as written in a config file.
///
/// A bare string is a prefix; a table with `pattern` is a regular expression.
/// Predicates only exist in code, see [`crate::routing::RouteDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RouteSetting {
    Prefix(String),
    Pattern { pattern: String },
}

impl Default for RouteSetting {
    fn default() -> Self {
        RouteSetting::Prefix("/api".to_string())
    }
}

/// Standalone server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Directory served to requests the sniffer passes through.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            static_dir: None,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout for the remote origin, in seconds.
    pub connect_secs: u64,

    /// Time allowed for the remote origin to return response headers, in seconds.
    /// 0 disables the deadline.
    pub remote_secs: u64,

    /// Time allowed for a mock to complete, in seconds. 0 disables the deadline.
    pub mock_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            remote_secs: 30,
            mock_secs: 10,
        }
    }
}

/// Limits applied to buffered request bodies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes for requests answered by a local mock.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
