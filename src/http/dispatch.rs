//! Request dispatch.
//!
//! # Responsibilities
//! - Admit or pass through each request by its pathname
//! - Decide once between the local mock and the remote origin
//! - Buffer the body only for local mocks
//! - Turn every failure into one error response
//!
//! # Design Decisions
//! - The decision happens before the body is touched
//! - Passthrough writes nothing and reads nothing
//! - The dispatcher owns its config; several instances can coexist

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::{validate_config, validate_settings, ConfigError, SnifferConfig};
use crate::http::body::BodyCollector;
use crate::http::error::DispatchError;
use crate::http::forward::RemoteProxyForwarder;
use crate::mock::MockExecutor;
use crate::observability::{metrics, notice};
use crate::routing::{PathMatcher, RouteDescriptor, RouteResolver};

/// Where an admitted request is answered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    /// Mock resource on disk.
    Local(PathBuf),
    /// Full remote URL.
    Remote(String),
}

impl DispatchDecision {
    pub fn mode(&self) -> &'static str {
        match self {
            DispatchDecision::Local(_) => "local",
            DispatchDecision::Remote(_) => "remote",
        }
    }
}

/// Intercepts requests and answers them from mocks or the remote origin.
#[derive(Debug)]
pub struct Dispatcher {
    config: Arc<SnifferConfig>,
    matcher: PathMatcher,
    resolver: RouteResolver,
    collector: BodyCollector,
    executor: MockExecutor,
    forwarder: RemoteProxyForwarder,
}

impl Dispatcher {
    /// Build from config, compiling the configured route.
    pub fn new(config: SnifferConfig) -> Result<Self, ConfigError> {
        let descriptor = RouteDescriptor::try_from(&config.route)?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Self::build(config, descriptor)
    }

    /// Build with an explicit route descriptor, e.g. a predicate.
    /// `config.route` is ignored, including its validation.
    pub fn with_route(config: SnifferConfig, descriptor: RouteDescriptor) -> Result<Self, ConfigError> {
        validate_settings(&config).map_err(ConfigError::Validation)?;
        Self::build(config, descriptor)
    }

    fn build(config: SnifferConfig, descriptor: RouteDescriptor) -> Result<Self, ConfigError> {
        let matcher = PathMatcher::build(&descriptor);
        let resolver = RouteResolver::from_config(&config, &descriptor)?;
        let collector = BodyCollector::new(config.limits.max_body_size);
        let executor = MockExecutor::new(
            (config.timeouts.mock_secs > 0).then(|| Duration::from_secs(config.timeouts.mock_secs)),
        );
        let forwarder = RemoteProxyForwarder::new(&config.timeouts)?;

        notice!(
            config.silence,
            info,
            route = ?descriptor,
            root = %config.root,
            remote = %config.remote,
            "Mock sniffer initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            matcher,
            resolver,
            collector,
            executor,
            forwarder,
        })
    }

    pub fn config(&self) -> &SnifferConfig {
        &self.config
    }

    /// Whether the request path is intercepted.
    pub fn admits(&self, pathname: &str) -> bool {
        self.matcher.matches(pathname)
    }

    /// Choose local or remote for an admitted request URL.
    pub async fn decide(&self, url: &str) -> DispatchDecision {
        if let Some(resource) = self.resolver.resolve_mock_resource_path(url) {
            if tokio::fs::try_exists(&resource).await.unwrap_or(false) {
                return DispatchDecision::Local(resource);
            }
        }
        DispatchDecision::Remote(self.resolver.remote_target(&self.config.remote, url))
    }

    /// Answer an admitted request. Always produces exactly one response.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let started = Instant::now();
        let url = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        let decision = self.decide(&url).await;
        let result = match &decision {
            DispatchDecision::Local(resource) => {
                notice!(self.config.silence, info, url = %url, resource = %resource.display(), "Local mock accessed");
                self.answer_locally(request, resource).await
            }
            DispatchDecision::Remote(target) => {
                notice!(self.config.silence, info, url = %url, target = %target, "Remote request accessed");
                self.forwarder.forward(request, target).await
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                notice!(
                    self.config.silence,
                    warn,
                    url = %url,
                    status = err.status().as_u16(),
                    code = %err.code(),
                    error = %err,
                    "Request failed"
                );
                err.into_response()
            }
        };

        metrics::record_dispatch(decision.mode(), response.status().as_u16(), started);
        response
    }

    async fn answer_locally(
        &self,
        request: Request<Body>,
        resource: &std::path::Path,
    ) -> Result<Response, DispatchError> {
        let (parts, body) = request.into_parts();
        let context = self.collector.collect(&parts, body).await?;
        self.executor.execute(resource, &context).await
    }
}

/// Axum middleware: intercept admitted requests, pass the rest to `next`.
///
/// ```ignore
/// let dispatcher = Arc::new(Dispatcher::new(config)?);
/// let app = Router::new()
///     .fallback(downstream)
///     .layer(axum::middleware::from_fn_with_state(dispatcher, sniff));
/// ```
pub async fn sniff(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !dispatcher.admits(request.uri().path()) {
        metrics::record_passthrough();
        return next.run(request).await;
    }

    dispatcher.dispatch(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteSetting;

    fn dispatcher(root: &std::path::Path) -> Dispatcher {
        Dispatcher::new(SnifferConfig {
            remote: "http://origin.test".into(),
            root: root.display().to_string(),
            silence: true,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn decides_local_when_resource_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("api")).unwrap();
        std::fs::write(dir.path().join("api/users.js"), "body: []").unwrap();

        let d = dispatcher(dir.path());
        assert_eq!(
            d.decide("/api/users?page=1").await,
            DispatchDecision::Local(dir.path().join("api/users.js"))
        );
    }

    #[tokio::test]
    async fn decides_remote_when_resource_missing() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());
        assert_eq!(
            d.decide("/api/missing?page=1").await,
            DispatchDecision::Remote("http://origin.test/api/missing?page=1".into())
        );
    }

    #[tokio::test]
    async fn empty_root_always_goes_remote() {
        let d = Dispatcher::new(SnifferConfig {
            root: String::new(),
            silence: true,
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(d.decide("/api/users").await, DispatchDecision::Remote(_)));
    }

    #[test]
    fn admits_by_pathname() {
        let d = Dispatcher::new(SnifferConfig {
            route: RouteSetting::Pattern { pattern: "^/v[0-9]+/".into() },
            silence: true,
            ..Default::default()
        })
        .unwrap();
        assert!(d.admits("/v2/users"));
        assert!(!d.admits("/api/users"));
    }

    #[test]
    fn invalid_route_fails_construction() {
        let err = Dispatcher::new(SnifferConfig {
            route: RouteSetting::Pattern { pattern: "(".into() },
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoute(_)));
    }

    #[test]
    fn explicit_descriptor_ignores_configured_route() {
        let config = SnifferConfig {
            route: RouteSetting::Pattern { pattern: "(".into() },
            silence: true,
            ..Default::default()
        };
        let d = Dispatcher::with_route(config, RouteDescriptor::predicate(|p| p.starts_with("/mock/")))
            .unwrap();
        assert!(d.admits("/mock/users"));
        assert!(!d.admits("/api/users"));
    }

    #[test]
    fn virtual_routing_with_predicate_requires_prefix() {
        let config = SnifferConfig {
            use_virtual_route: true,
            silence: true,
            ..Default::default()
        };
        let err = Dispatcher::with_route(config, RouteDescriptor::predicate(|p| p.contains("/mock/")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoute(_)));
    }
}
