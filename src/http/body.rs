//! Request body collection for locally mocked requests.
//!
//! # Responsibilities
//! - Buffer the incoming body stream chunk by chunk
//! - Decode it as text, then try JSON; keep the text when that fails
//! - Parse the query string into a map
//! - Build the `RequestContext` handed to mocks
//!
//! # Design Decisions
//! - Only the local branch buffers; remote requests stream untouched
//! - The first stream error ends collection and becomes the response
//! - Bodies over the configured limit are rejected mid-stream

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{request::Parts, Method};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::error::DispatchError;
use crate::routing::split_url;

/// Best-effort decoded request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

impl RequestBody {
    /// Text decode first, then JSON.
    pub fn decode(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw).into_owned();
        match serde_json::from_str(&text) {
            Ok(value) => RequestBody::Json(value),
            Err(_) => RequestBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            RequestBody::Text(_) => None,
        }
    }
}

/// Everything a mock can see about the request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    pub url: String,
    pub path: String,
    pub query: Map<String, Value>,
    pub headers: HashMap<String, String>,
    #[serde(skip)]
    pub raw_body: Vec<u8>,
    pub body: RequestBody,
}

fn serialize_method<S: serde::Serializer>(method: &Method, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(method.as_str())
}

impl RequestContext {
    /// Assemble a context from request parts and an already collected body.
    pub fn new(parts: &Parts, raw_body: Vec<u8>) -> Self {
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let (path, _) = split_url(&url);

        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            method: parts.method.clone(),
            query: parse_query(&url),
            path,
            url,
            headers,
            body: RequestBody::decode(&raw_body),
            raw_body,
        }
    }
}

/// Parse the query string of a URL. Repeated keys collect into an array.
pub fn parse_query(url: &str) -> Map<String, Value> {
    let mut query = Map::new();
    let Some((_, raw)) = url.split_once('?') else {
        return query;
    };
    let raw = raw.split('#').next().unwrap_or(raw);

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = Value::String(value.into_owned());
        match query.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                query.insert(key.into_owned(), value);
            }
        }
    }
    query
}

/// Buffers request bodies up to a limit.
#[derive(Debug, Clone)]
pub struct BodyCollector {
    limit: usize,
}

impl BodyCollector {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Read the whole body and build the request context.
    pub async fn collect(&self, parts: &Parts, body: Body) -> Result<RequestContext, DispatchError> {
        let mut stream = body.into_data_stream();
        let mut buffer = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(DispatchError::Stream)?;
            if buffer.len() + chunk.len() > self.limit {
                return Err(DispatchError::BodyTooLarge { limit: self.limit });
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(RequestContext::new(parts, buffer))
    }
}
