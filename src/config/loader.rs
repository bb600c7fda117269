//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::SnifferConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading and dispatcher setup.
///
/// Every variant is fatal: it is raised while the sniffer is being built,
/// never while a request is in flight.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    /// The route descriptor could not be compiled into a matcher.
    InvalidRoute(String),
    /// The outbound HTTP client could not be constructed.
    Client(reqwest::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::InvalidRoute(reason) => write!(f, "Invalid route: {}", reason),
            ConfigError::Client(e) => write!(f, "HTTP client error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SnifferConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SnifferConfig, ConfigError> {
    let config: SnifferConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
