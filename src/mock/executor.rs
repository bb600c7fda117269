//! Mock execution.
//!
//! # Responsibilities
//! - Read the mock resource for an admitted request
//! - Compile it into a handler and run it with the request, a response sink
//!   and a single-shot completion
//! - Serialize the completion value as the JSON response
//!
//! # Design Decisions
//! - `Completion::complete` consumes the handle: completing twice does not compile
//! - A handler that drops its completion unanswered fails the request
//! - If a handler completes and then reports an error, the completion wins
//! - Optional deadline on waiting for completion

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::http::body::RequestContext;
use crate::http::error::DispatchError;
use crate::mock::descriptor::DeclarativeMock;
use crate::mock::template::TemplateEngine;

/// Failure raised by a mock while compiling or running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MockError {
    pub code: String,
    pub message: String,
}

impl MockError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: String::new(),
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<MockError> for DispatchError {
    fn from(err: MockError) -> Self {
        DispatchError::Execution {
            code: err.code,
            message: err.message,
        }
    }
}

/// Single-shot completion handed to a mock.
///
/// Calling [`Completion::complete`] consumes the handle, so a mock can
/// complete at most once. It may complete before `run` returns or later from
/// a spawned task.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Value>,
}

impl Completion {
    pub fn channel() -> (Self, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver the response value. Returns false if the request already ended.
    pub fn complete(self, value: Value) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Response sink handed to a mock: status and extra headers.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: BTreeMap<String, String>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: BTreeMap::new(),
        }
    }
}

impl MockResponse {
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Serialize the completion value into the final response.
    pub fn finish(self, value: &Value) -> Result<Response, DispatchError> {
        let body = serde_json::to_vec(value).map_err(|e| DispatchError::execution(e.to_string()))?;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DispatchError::execution(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| DispatchError::execution(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }
        Ok(response)
    }
}

/// Mock logic bound to one request.
pub trait MockHandler: Send + Sync {
    /// Run the mock. It must eventually call `done.complete(..)` exactly once,
    /// either before returning or from a task it spawns.
    fn run(
        &self,
        request: &RequestContext,
        response: &mut MockResponse,
        done: Completion,
    ) -> Result<(), MockError>;
}

/// Loads mock resources from disk and runs them.
#[derive(Debug, Clone)]
pub struct MockExecutor {
    templates: Arc<TemplateEngine>,
    timeout: Option<Duration>,
}

impl MockExecutor {
    /// `timeout` of `None` waits for completion indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            templates: Arc::new(TemplateEngine::new()),
            timeout,
        }
    }

    /// Read, compile and run the mock at `resource`.
    pub async fn execute(
        &self,
        resource: &Path,
        request: &RequestContext,
    ) -> Result<Response, DispatchError> {
        let bytes = tokio::fs::read(resource)
            .await
            .map_err(DispatchError::not_found)?;
        let source = String::from_utf8(bytes)
            .map_err(|e| DispatchError::execution(format!("invalid mock resource: {e}")))?;

        let handler = DeclarativeMock::compile(&source, Arc::clone(&self.templates))?;
        self.run_handler(&handler, request).await
    }

    /// Run any handler and turn its completion into a response.
    pub async fn run_handler<H>(
        &self,
        handler: &H,
        request: &RequestContext,
    ) -> Result<Response, DispatchError>
    where
        H: MockHandler + ?Sized,
    {
        let mut sink = MockResponse::default();
        let (done, mut completed) = Completion::channel();

        if let Err(err) = handler.run(request, &mut sink, done) {
            // A completion delivered before the error already settled the request.
            return match completed.try_recv() {
                Ok(value) => sink.finish(&value),
                Err(_) => Err(err.into()),
            };
        }

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, completed)
                .await
                .map_err(|_| DispatchError::MockTimeout(limit))?,
            None => completed.await,
        };

        let value = outcome.map_err(|_| DispatchError::execution("mock finished without completing"))?;
        sink.finish(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn request() -> RequestContext {
        let (parts, _) = Request::builder().uri("/api/x").body(()).unwrap().into_parts();
        RequestContext::new(&parts, Vec::new())
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    struct Immediate(Value);

    impl MockHandler for Immediate {
        fn run(&self, _: &RequestContext, _: &mut MockResponse, done: Completion) -> Result<(), MockError> {
            done.complete(self.0.clone());
            Ok(())
        }
    }

    struct Later;

    impl MockHandler for Later {
        fn run(&self, _: &RequestContext, res: &mut MockResponse, done: Completion) -> Result<(), MockError> {
            res.set_header("x-mock", "later");
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.complete(json!({"late": true}));
            });
            Ok(())
        }
    }

    struct Forgets;

    impl MockHandler for Forgets {
        fn run(&self, _: &RequestContext, _: &mut MockResponse, _done: Completion) -> Result<(), MockError> {
            Ok(())
        }
    }

    struct CompletesThenFails;

    impl MockHandler for CompletesThenFails {
        fn run(&self, _: &RequestContext, _: &mut MockResponse, done: Completion) -> Result<(), MockError> {
            done.complete(json!("first"));
            Err(MockError::new("second"))
        }
    }

    struct Hangs;

    impl MockHandler for Hangs {
        fn run(&self, _: &RequestContext, _: &mut MockResponse, done: Completion) -> Result<(), MockError> {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                done.complete(Value::Null);
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn synchronous_completion() {
        let executor = MockExecutor::new(None);
        let response = executor.run_handler(&Immediate(json!({"a": 1})), &request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_of(response).await, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn asynchronous_completion() {
        let executor = MockExecutor::new(Some(Duration::from_secs(5)));
        let response = executor.run_handler(&Later, &request()).await.unwrap();
        assert_eq!(response.headers()["x-mock"], "later");
        assert_eq!(body_of(response).await, r#"{"late":true}"#);
    }

    #[tokio::test]
    async fn dropped_completion_is_an_execution_error() {
        let err = MockExecutor::new(None).run_handler(&Forgets, &request()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Execution { .. }));
    }

    #[tokio::test]
    async fn first_terminal_state_wins() {
        let response = MockExecutor::new(None)
            .run_handler(&CompletesThenFails, &request())
            .await
            .unwrap();
        assert_eq!(body_of(response).await, r#""first""#);
    }

    #[tokio::test]
    async fn deadline_applies() {
        let err = MockExecutor::new(Some(Duration::from_millis(20)))
            .run_handler(&Hangs, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MockTimeout(_)));
    }

    #[tokio::test]
    async fn non_utf8_resource_is_an_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let resource = dir.path().join("bad.js");
        std::fs::write(&resource, [0xff, 0xfe, 0x00]).unwrap();

        let err = MockExecutor::new(None).execute(&resource, &request()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "");
    }

    #[tokio::test]
    async fn missing_resource_is_not_found() {
        let err = MockExecutor::new(None)
            .execute(Path::new("/no/such/mock.js"), &request())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
