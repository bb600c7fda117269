//! Per-request failures and their uniform response.
//!
//! # Responsibilities
//! - Name every way an admitted request can fail
//! - Map each failure to a status code and machine code
//! - Render `{code, message}` as the single terminal response
//!
//! # Design Decisions
//! - Status defaults to 500 when the failure carries none
//! - Code and message default to empty strings
//! - Rendering consumes the error, so one failure yields one response

use std::io;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Failure of an admitted request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The mock resource is missing or unreadable.
    #[error("{source}")]
    NotFound {
        #[source]
        source: io::Error,
    },

    /// The mock failed to compile or raised an error while running.
    #[error("{message}")]
    Execution { code: String, message: String },

    /// The remote origin could not be reached.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The request body stream failed before it was fully read.
    #[error("{0}")]
    Stream(axum::Error),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The remote origin did not answer within the deadline.
    #[error("remote origin did not respond within {0:?}")]
    RemoteTimeout(Duration),

    /// The mock did not complete within the deadline.
    #[error("mock did not complete within {0:?}")]
    MockTimeout(Duration),
}

impl DispatchError {
    pub fn not_found(source: io::Error) -> Self {
        DispatchError::NotFound { source }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        DispatchError::Execution {
            code: String::new(),
            message: message.into(),
        }
    }

    /// HTTP status written for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Execution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Transport(e) => e.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            DispatchError::Stream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::RemoteTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::MockTimeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, empty when the failure has none.
    pub fn code(&self) -> &str {
        match self {
            DispatchError::NotFound { source } => match source.kind() {
                io::ErrorKind::NotFound => "ENOENT",
                io::ErrorKind::PermissionDenied => "EACCES",
                _ => "",
            },
            DispatchError::Execution { code, .. } => code,
            DispatchError::Transport(e) if e.is_timeout() => "ETIMEDOUT",
            DispatchError::Transport(e) if e.is_connect() => "ECONNREFUSED",
            DispatchError::Transport(_) | DispatchError::Stream(_) => "",
            DispatchError::BodyTooLarge { .. } => "",
            DispatchError::RemoteTimeout(_) | DispatchError::MockTimeout(_) => "ETIMEDOUT",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = serde_json::to_vec(&self.envelope()).unwrap_or_default();
        let mut response = (self.status(), body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}
