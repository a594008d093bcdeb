//! Typed configuration for restapi.
//!
//! - TOML and JSON configuration files
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults or preset, then files)
//!
//! # Overview
//!
//! [`RestApiConfig`] holds three sections:
//!
//! - [`ResourceConfig`] - body size limit and default MIME type
//! - [`ProblemConfig`] - problem document type URIs and detail exposure
//! - [`LoggingConfig`] - log level and output format
//!
//! Apply it to a resource with `Resource::with_config` and to logging with
//! [`LoggingConfig::log_config`].
//!
//! # Example
//!
//! ```no_run
//! use restapi_config::ConfigLoader;
//!
//! # fn main() -> Result<(), restapi_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("restapi.toml")?
//!     .load()?;
//!
//! println!("bodies are capped at {} bytes", config.resource.body_read_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [resource]
//! body_read_limit = 1048576
//! default_mime = "application/json"
//!
//! [problem]
//! base_url = "https://errors.example.com"
//! expose_details = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/restapi-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{RestApiConfig, RestApiConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingConfig, ProblemConfig, ResourceConfig};
