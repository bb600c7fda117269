//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (raw URL)
//!     → matcher.rs (is the pathname intercepted?)
//!     → resolver.rs (local mock path, remote target)
//!     → Return: admitted + resolved paths, or passthrough
//!
//! Route Compilation (at startup):
//!     RouteSetting / RouteDescriptor
//!     → Compile matcher (prefix, regex, predicate)
//!     → Freeze as immutable PathMatcher
//! ```
//!
//! # Design Decisions
//! - Route compiled once per dispatcher, immutable at runtime
//! - Matching sees the pathname only, never the query string
//! - Resolution is plain string work; the filesystem is checked by the dispatcher

pub mod matcher;
pub mod resolver;

pub use matcher::{Matcher, PathMatcher, PathPredicate, RouteDescriptor};
pub use resolver::{split_url, RouteResolver};
