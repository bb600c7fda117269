//! Route matching logic.
//!
//! # Responsibilities
//! - Compile a route descriptor into a predicate over request paths
//! - Match path prefix (case-sensitive, offset 0, no normalization)
//! - Match regular expressions anywhere in the path
//! - Delegate to caller-supplied predicates unchanged
//!
//! # Design Decisions
//! - Compilation happens once per dispatcher; matching never fails
//! - Regex compile errors surface as `ConfigError` at build time

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::config::{ConfigError, RouteSetting};

/// Caller-supplied path predicate.
pub type PathPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Which requests the sniffer intercepts.
#[derive(Clone)]
pub enum RouteDescriptor {
    /// Matches when the path starts with the string.
    Prefix(String),
    /// Matches when the expression finds a match anywhere in the path.
    Pattern(Regex),
    /// Used verbatim.
    Predicate(PathPredicate),
}

impl RouteDescriptor {
    /// Build a predicate descriptor from a closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        RouteDescriptor::Predicate(Arc::new(f))
    }

    /// The literal prefix, if this is a prefix descriptor.
    pub fn as_prefix(&self) -> Option<&str> {
        match self {
            RouteDescriptor::Prefix(prefix) => Some(prefix),
            _ => None,
        }
    }
}

impl TryFrom<&RouteSetting> for RouteDescriptor {
    type Error = ConfigError;

    fn try_from(setting: &RouteSetting) -> Result<Self, Self::Error> {
        match setting {
            RouteSetting::Prefix(prefix) => Ok(RouteDescriptor::Prefix(prefix.clone())),
            RouteSetting::Pattern { pattern } => Regex::new(pattern)
                .map(RouteDescriptor::Pattern)
                .map_err(|e| ConfigError::InvalidRoute(e.to_string())),
        }
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDescriptor::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            RouteDescriptor::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            RouteDescriptor::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Trait for matching request paths against a route.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the path is intercepted.
    fn matches(&self, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches a regular expression anywhere in the path.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Regex,
}

impl Matcher for PatternMatcher {
    fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Delegates to a caller-supplied predicate.
pub struct PredicateMatcher {
    predicate: PathPredicate,
}

impl fmt::Debug for PredicateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateMatcher")
    }
}

impl Matcher for PredicateMatcher {
    fn matches(&self, path: &str) -> bool {
        (self.predicate)(path)
    }
}

/// Compiled route matcher shared by every request.
#[derive(Debug)]
pub struct PathMatcher {
    inner: Box<dyn Matcher>,
}

impl PathMatcher {
    /// Compile a descriptor.
    pub fn build(descriptor: &RouteDescriptor) -> Self {
        let inner: Box<dyn Matcher> = match descriptor {
            RouteDescriptor::Prefix(prefix) => Box::new(PathPrefixMatcher::new(prefix.clone())),
            RouteDescriptor::Pattern(pattern) => Box::new(PatternMatcher {
                pattern: pattern.clone(),
            }),
            RouteDescriptor::Predicate(predicate) => Box::new(PredicateMatcher {
                predicate: Arc::clone(predicate),
            }),
        };
        Self { inner }
    }

    /// Compile straight from a config file setting.
    pub fn from_setting(setting: &RouteSetting) -> Result<Self, ConfigError> {
        let descriptor = RouteDescriptor::try_from(setting)?;
        Ok(Self::build(&descriptor))
    }

    pub fn matches(&self, path: &str) -> bool {
        self.inner.matches(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATHS: &[&str] = &["/api", "/api/users", "/apix", "/other/api", "api/users", "", "/"];

    #[test]
    fn test_prefix_is_starts_with() {
        let matcher = PathMatcher::build(&RouteDescriptor::Prefix("/api".into()));
        for path in PATHS {
            assert_eq!(matcher.matches(path), path.starts_with("/api"), "path {path:?}");
        }
        // No trailing-slash handling.
        assert!(matcher.matches("/apix"));
    }

    #[test]
    fn test_pattern_matches_anywhere() {
        let re = Regex::new("api/[a-z]+").unwrap();
        let matcher = PathMatcher::build(&RouteDescriptor::Pattern(re.clone()));
        for path in PATHS {
            assert_eq!(matcher.matches(path), re.is_match(path), "path {path:?}");
        }
        assert!(matcher.matches("/v2/api/users"));
    }

    #[test]
    fn test_predicate_is_used_verbatim() {
        let f = |path: &str| path.len() % 2 == 0;
        let matcher = PathMatcher::build(&RouteDescriptor::predicate(f));
        for path in PATHS {
            assert_eq!(matcher.matches(path), f(path), "path {path:?}");
        }
    }

    #[test]
    fn test_invalid_pattern_fails_at_build() {
        let err = PathMatcher::from_setting(&RouteSetting::Pattern { pattern: "[".into() })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoute(_)));
    }

    #[test]
    fn test_setting_prefix_compiles() {
        let matcher = PathMatcher::from_setting(&RouteSetting::Prefix("/mock".into())).unwrap();
        assert!(matcher.matches("/mock/a"));
        assert!(!matcher.matches("/api/a"));
    }
}
