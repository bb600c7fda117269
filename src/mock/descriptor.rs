//! Declarative mock resources.
//!
//! A mock resource is a YAML (or JSON) document:
//!
//! ```yaml
//! status: 200              # optional, default 200
//! headers:                 # optional extra response headers
//!   x-mock: "true"
//! delay_ms: 150            # optional, complete after a delay
//! body:                    # any JSON value; strings are templates
//!   id: "{{query.id}}"
//!   name: "{{default body.name \"anonymous\"}}"
//! throw: "database offline"  # optional, fail with this message instead
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::http::body::RequestContext;
use crate::mock::executor::{Completion, MockError, MockHandler, MockResponse};
use crate::mock::template::TemplateEngine;

/// Parsed mock document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockDescriptor {
    /// Response status. Replaces the fixed 200 a mock answers with otherwise.
    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub delay_ms: u64,

    #[serde(default)]
    pub body: Value,

    #[serde(default)]
    pub throw: Option<Thrown>,
}

fn default_status() -> u16 {
    200
}

/// Failure a mock raises on purpose.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Thrown {
    Message(String),
    Detailed {
        #[serde(default)]
        code: String,
        #[serde(default)]
        message: String,
    },
}

impl From<&Thrown> for MockError {
    fn from(thrown: &Thrown) -> Self {
        match thrown {
            Thrown::Message(message) => MockError::new(message.clone()),
            Thrown::Detailed { code, message } => MockError::with_code(code.clone(), message.clone()),
        }
    }
}

/// A compiled mock document ready to run.
#[derive(Debug)]
pub struct DeclarativeMock {
    descriptor: MockDescriptor,
    templates: Arc<TemplateEngine>,
}

impl DeclarativeMock {
    /// Parse resource text. Any parse failure is an execution error.
    pub fn compile(source: &str, templates: Arc<TemplateEngine>) -> Result<Self, MockError> {
        let descriptor: MockDescriptor = serde_yaml::from_str(source)
            .map_err(|e| MockError::new(format!("invalid mock resource: {e}")))?;

        StatusCode::from_u16(descriptor.status)
            .map_err(|_| MockError::new(format!("invalid status {}", descriptor.status)))?;

        Ok(Self {
            descriptor,
            templates,
        })
    }

    pub fn descriptor(&self) -> &MockDescriptor {
        &self.descriptor
    }
}

impl MockHandler for DeclarativeMock {
    fn run(
        &self,
        request: &RequestContext,
        response: &mut MockResponse,
        done: Completion,
    ) -> Result<(), MockError> {
        if let Some(thrown) = &self.descriptor.throw {
            return Err(thrown.into());
        }

        let status = StatusCode::from_u16(self.descriptor.status)
            .map_err(|_| MockError::new(format!("invalid status {}", self.descriptor.status)))?;
        response.set_status(status);
        for (name, value) in &self.descriptor.headers {
            let value = self
                .templates
                .render(value, request)
                .map_err(|e| MockError::new(e.to_string()))?;
            response.set_header(name.clone(), value);
        }

        let value = self
            .templates
            .render_value(&self.descriptor.body, request)
            .map_err(|e| MockError::new(e.to_string()))?;

        if self.descriptor.delay_ms == 0 {
            done.complete(value);
        } else {
            let delay = Duration::from_millis(self.descriptor.delay_ms);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                done.complete(value);
            });
        }
        Ok(())
    }
}
