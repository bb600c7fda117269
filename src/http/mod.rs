//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → dispatch.rs (admit? → decide local/remote)
//!         ├─ not admitted → next service (passthrough)
//!         ├─ Local  → body.rs (buffer + decode) → mock executor
//!         └─ Remote → forward.rs (stream to origin and back)
//!     → error.rs (any failure → {code, message})
//!     → Send to client
//! ```

pub mod body;
pub mod dispatch;
pub mod error;
pub mod forward;
pub mod server;

pub use body::{BodyCollector, RequestBody, RequestContext};
pub use dispatch::{sniff, DispatchDecision, Dispatcher};
pub use error::{DispatchError, ErrorEnvelope};
pub use forward::RemoteProxyForwarder;
pub use server::HttpServer;
