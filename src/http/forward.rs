//! Remote forwarding.
//!
//! # Responsibilities
//! - Send the request to the remote origin with the original method
//! - Stream the request body out and the response body back
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - No buffering: backpressure flows through both bodies
//! - TLS certificates are not validated (development origins are often self-signed)
//! - Only the wait for response headers is time-limited; bodies are not

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderName, Request},
    response::Response,
};

use crate::config::{ConfigError, TimeoutConfig};
use crate::http::error::DispatchError;

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove headers that describe a single connection rather than the message.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(listed.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Streams requests to the remote origin.
#[derive(Debug, Clone)]
pub struct RemoteProxyForwarder {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl RemoteProxyForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(ConfigError::Client)?;

        let timeout = (timeouts.remote_secs > 0).then(|| Duration::from_secs(timeouts.remote_secs));
        Ok(Self { client, timeout })
    }

    /// Forward `request` to `target` and stream the answer back.
    pub async fn forward(&self, request: Request<Body>, target: &str) -> Result<Response, DispatchError> {
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        let mut outbound = self.client.request(parts.method, target).headers(headers);
        // Bodyless requests must not turn into chunked uploads.
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }
        let outbound = outbound.send();

        let upstream = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, outbound)
                .await
                .map_err(|_| DispatchError::RemoteTimeout(limit))??,
            None => outbound.await?,
        };

        let mut response = Response::new(Body::empty());
        *response.status_mut() = upstream.status();
        *response.headers_mut() = upstream.headers().clone();
        strip_hop_by_hop(response.headers_mut());
        *response.body_mut() = Body::from_stream(upstream.bytes_stream());

        Ok(response)
    }
}
