//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the route compiles and virtual routing has something to strip
//! - Validate value ranges (timeouts, body limits, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SnifferConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{RouteSetting, SnifferConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &SnifferConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = setting_errors(config);
    errors.extend(route_errors(config));
    into_result(errors)
}

/// Check everything except `route`, for dispatchers given an explicit descriptor.
pub fn validate_settings(config: &SnifferConfig) -> Result<(), Vec<ValidationError>> {
    into_result(setting_errors(config))
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn setting_errors(config: &SnifferConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !config.remote.is_empty() {
        match url::Url::parse(&config.remote) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                "remote",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("remote", e.to_string())),
        }
    }

    if !config.extension.starts_with('.') {
        errors.push(ValidationError::new("extension", "must start with '.'"));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::new("limits.max_body_size", "must be greater than 0"));
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }

    errors
}

fn route_errors(config: &SnifferConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match &config.route {
        RouteSetting::Prefix(prefix) => {
            if config.use_virtual_route && prefix.is_empty() && config.virtual_prefix.is_none() {
                errors.push(ValidationError::new(
                    "route",
                    "virtual routing needs a non-empty prefix",
                ));
            }
        }
        RouteSetting::Pattern { pattern } => {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ValidationError::new("route", e.to_string()));
            }
            if config.use_virtual_route && config.virtual_prefix.is_none() {
                errors.push(ValidationError::new(
                    "virtual_prefix",
                    "required when virtual routing is used with a pattern route",
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SnifferConfig::default()).is_ok());
    }

    #[test]
    fn rejects_non_http_remote() {
        let config = SnifferConfig {
            remote: "ftp://origin.test".into(),
            ..Default::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "remote");
    }

    #[test]
    fn pattern_route_must_compile() {
        let config = SnifferConfig {
            route: RouteSetting::Pattern { pattern: "(".into() },
            ..Default::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "route");
    }

    #[test]
    fn virtual_routing_with_pattern_needs_explicit_prefix() {
        let mut config = SnifferConfig {
            route: RouteSetting::Pattern { pattern: "^/api".into() },
            use_virtual_route: true,
            ..Default::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "virtual_prefix");

        config.virtual_prefix = Some("/api".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn settings_check_ignores_route() {
        let config = SnifferConfig {
            route: RouteSetting::Pattern { pattern: "(".into() },
            use_virtual_route: true,
            virtual_prefix: Some("/mock".into()),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
        assert!(validate_settings(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = SnifferConfig::default();
        config.timeouts.connect_secs = 0;
        config.limits.max_body_size = 0;
        config.server.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["timeouts.connect_secs", "limits.max_body_size", "server.bind_address"]
        );
    }
}
