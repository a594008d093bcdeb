//! The top-level [`RestApiConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, ProblemConfig, ResourceConfig};
use restapi_codec::SerializerRegistry;

/// Complete restapi configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files.
///
/// # Example
///
/// ```
/// use restapi_config::RestApiConfig;
///
/// let config = RestApiConfig::default();
/// assert_eq!(config.resource.body_read_limit, 1024 * 1024);
/// assert!(config.problem.base_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RestApiConfig {
    /// Resource handler settings.
    #[serde(default)]
    pub resource: ResourceConfig,

    /// Problem document settings.
    #[serde(default)]
    pub problem: ProblemConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RestApiConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use restapi_config::{RestApiConfig, ResourceConfig};
    ///
    /// let config = RestApiConfig::builder()
    ///     .resource(ResourceConfig {
    ///         body_read_limit: 4096,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.resource.body_read_limit, 4096);
    /// ```
    #[must_use]
    pub fn builder() -> RestApiConfigBuilder {
        RestApiConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `resource.body_read_limit` is zero
    /// - `resource.default_mime` has no built-in serializer
    /// - `problem.base_url` is set but empty
    /// - `logging.level` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource.body_read_limit == 0 {
            return Err(ConfigError::invalid_value(
                "resource.body_read_limit",
                "must be greater than zero",
            ));
        }

        if !SerializerRegistry::new().contains(&self.resource.default_mime) {
            return Err(ConfigError::invalid_value(
                "resource.default_mime",
                format!("no serializer for {}", self.resource.default_mime),
            ));
        }

        if let Some(base_url) = &self.problem.base_url {
            if base_url.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "problem.base_url",
                    "must not be empty when set",
                ));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors
    /// - Debug log level
    /// - Internal error messages sent to clients
    ///
    /// # Example
    ///
    /// ```
    /// use restapi_config::RestApiConfig;
    ///
    /// let config = RestApiConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.problem.expose_details);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.problem.expose_details = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting
    /// - Info log level
    /// - Internal error messages hidden
    ///
    /// # Example
    ///
    /// ```
    /// use restapi_config::RestApiConfig;
    ///
    /// let config = RestApiConfig::production();
    /// assert_eq!(config.logging.format, restapi_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.problem.expose_details = false;

        config
    }
}

/// Builder for [`RestApiConfig`].
#[derive(Debug, Default)]
pub struct RestApiConfigBuilder {
    resource: Option<ResourceConfig>,
    problem: Option<ProblemConfig>,
    logging: Option<LoggingConfig>,
}

impl RestApiConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource section.
    #[must_use]
    pub fn resource(mut self, resource: ResourceConfig) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Set the problem section.
    #[must_use]
    pub fn problem(mut self, problem: ProblemConfig) -> Self {
        self.problem = Some(problem);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the problem type base URL.
    #[must_use]
    pub fn problem_base_url(mut self, base_url: impl Into<String>) -> Self {
        let problem = self.problem.take().unwrap_or_default();
        self.problem = Some(ProblemConfig {
            base_url: Some(base_url.into()),
            ..problem
        });
        self
    }

    /// Set the request body limit.
    #[must_use]
    pub fn body_read_limit(mut self, limit: usize) -> Self {
        let resource = self.resource.take().unwrap_or_default();
        self.resource = Some(ResourceConfig {
            body_read_limit: limit,
            ..resource
        });
        self
    }

    /// Build the configuration, using defaults for unset sections.
    #[must_use]
    pub fn build(self) -> RestApiConfig {
        RestApiConfig {
            resource: self.resource.unwrap_or_default(),
            problem: self.problem.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}
