//! Local mock subsystem.
//!
//! # Data Flow
//! ```text
//! {root}{path}{extension}
//!     → executor.rs (read resource; missing → 404)
//!     → descriptor.rs (parse declarative document; failure → 500)
//!     → template.rs (render body/headers against the request)
//!     → Completion (single shot) → JSON response
//! ```
//!
//! # Design Decisions
//! - Mock resources are data, not code: no arbitrary execution at request time
//! - Handlers see exactly three things: the request, a response sink, a completion
//! - Custom handlers plug in through the `MockHandler` trait

pub mod descriptor;
pub mod executor;
pub mod template;

pub use descriptor::{DeclarativeMock, MockDescriptor};
pub use executor::{Completion, MockError, MockExecutor, MockHandler, MockResponse};
pub use template::TemplateEngine;
