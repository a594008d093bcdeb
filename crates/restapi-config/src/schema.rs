//! Configuration schema types.

use restapi_codec::DEFAULT_BODY_LIMIT;
use restapi_core::ProblemWriter;
use restapi_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Resource handler settings.
///
/// # Example
///
/// ```
/// use restapi_config::ResourceConfig;
///
/// let config = ResourceConfig {
///     body_read_limit: 64 * 1024,
///     ..Default::default()
/// };
/// assert_eq!(config.default_mime, "application/json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Maximum request body size in bytes.
    #[serde(default = "default_body_read_limit")]
    pub body_read_limit: usize,

    /// MIME type used when a request names none.
    #[serde(default = "default_mime")]
    pub default_mime: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            body_read_limit: default_body_read_limit(),
            default_mime: default_mime(),
        }
    }
}

fn default_body_read_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

fn default_mime() -> String {
    restapi_core::mime::APPLICATION_JSON.to_string()
}

/// Problem document settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProblemConfig {
    /// Base URL prefixed to problem type identifiers.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Send internal error messages to clients.
    #[serde(default)]
    pub expose_details: bool,
}

impl ProblemConfig {
    /// Builds the problem writer these settings describe.
    ///
    /// ```
    /// use restapi_config::ProblemConfig;
    ///
    /// let config = ProblemConfig {
    ///     base_url: Some("https://errors.example.com".into()),
    ///     expose_details: false,
    /// };
    /// let _writer = config.writer();
    /// ```
    pub fn writer(&self) -> ProblemWriter {
        let writer = ProblemWriter::new().expose_details(self.expose_details);
        match &self.base_url {
            Some(base_url) => writer.base_url(base_url.clone()),
            None => writer,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Service name attached to log output.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
            service_name: default_service_name(),
        }
    }
}

impl LoggingConfig {
    /// Converts to the subscriber settings used by
    /// [`init_logging`](restapi_telemetry::init_logging).
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.include_location,
            ansi: self.ansi_enabled,
            service_name: self.service_name.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "restapi".to_string()
}
