//! Structured logging for restapi services.
//!
//! Every restapi crate logs through [`tracing`]. This crate installs the
//! subscriber that turns those events into output:
//!
//! - **JSON** lines for production, one object per event
//! - **Pretty** multi-line output for development
//!
//! Filtering uses [`EnvFilter`](tracing_subscriber::EnvFilter) directives, so
//! per-crate levels such as `restapi_router=debug,info` work.
//!
//! # Events
//!
//! | Target | Level | Event |
//! |--------|-------|-------|
//! | `restapi_router` | debug | route resolved, routing failure |
//! | `restapi_resource` | warn | index stream closed early |
//! | `restapi_resource` | error | operation panicked |
//! | `restapi_core` | error | 5xx problem written |
//!
//! # Example
//!
//! ```rust,ignore
//! use restapi_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), restapi_telemetry::TelemetryError> {
//!     init_logging(&LogConfig::production().with_service_name("foos"))?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/restapi-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
