//! Path and target resolution.
//!
//! # Responsibilities
//! - Split a request URL into pathname and pathname+query
//! - Apply virtual-route stripping
//! - Derive the local mock resource path and the remote target URL
//!
//! # Design Decisions
//! - Resolution is string concatenation; no normalization or decoding
//! - Virtual routing removes the first literal occurrence of a string, so it
//!   needs a literal: the prefix itself or an explicit `virtual_prefix`
//! - Paths with `..` segments never resolve to a local resource

use std::path::PathBuf;

use axum::http::Uri;

use crate::config::{ConfigError, SnifferConfig};
use crate::routing::matcher::RouteDescriptor;

/// Split a raw URL into `(pathname, pathname + query)`.
pub fn split_url(url: &str) -> (String, String) {
    if url.is_empty() {
        return (String::new(), String::new());
    }

    match url.parse::<Uri>() {
        Ok(uri) => {
            let pathname = uri.path().to_string();
            let path = uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| pathname.clone());
            (pathname, path)
        }
        Err(_) => {
            let path = url.split('#').next().unwrap_or(url);
            let pathname = path.split('?').next().unwrap_or(path);
            (pathname.to_string(), path.to_string())
        }
    }
}

/// Resolves request URLs to local resources and remote targets.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    root: String,
    extension: String,
    strip: Option<String>,
}

impl RouteResolver {
    pub fn new(root: impl Into<String>, extension: impl Into<String>, strip: Option<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            strip,
        }
    }

    /// Build from config, deciding what virtual routing strips.
    pub fn from_config(
        config: &SnifferConfig,
        descriptor: &RouteDescriptor,
    ) -> Result<Self, ConfigError> {
        let strip = if config.use_virtual_route {
            let literal = config
                .virtual_prefix
                .clone()
                .or_else(|| descriptor.as_prefix().map(str::to_string))
                .ok_or_else(|| {
                    ConfigError::InvalidRoute(
                        "virtual routing needs a prefix route or an explicit virtual_prefix"
                            .to_string(),
                    )
                })?;
            Some(literal)
        } else {
            None
        };

        Ok(Self::new(config.root.clone(), config.extension.clone(), strip))
    }

    /// The pathname, or pathname + query when `include_query` is set, with
    /// virtual-route stripping applied.
    pub fn resolve_path(&self, url: &str, include_query: bool) -> String {
        let (pathname, path) = split_url(url);
        let resolved = if include_query { path } else { pathname };

        match &self.strip {
            Some(literal) => resolved.replacen(literal.as_str(), "", 1),
            None => resolved,
        }
    }

    /// Where the mock for this URL would live, or `None` when there can be no
    /// local resource.
    pub fn resolve_mock_resource_path(&self, url: &str) -> Option<PathBuf> {
        if url.is_empty() || self.root.is_empty() {
            return None;
        }

        let path = self.resolve_path(url, false);
        if path.split('/').any(|segment| segment == "..") {
            return None;
        }

        Some(PathBuf::from(format!("{}{}{}", self.root, path, self.extension)))
    }

    /// Remote URL for this request: base + path + query.
    pub fn remote_target(&self, remote: &str, url: &str) -> String {
        format!("{}{}", remote, self.resolve_path(url, true))
    }
}
