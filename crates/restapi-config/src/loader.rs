//! Configuration loader with layered approach.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, RestApiConfig};

/// Configuration loader with layered approach.
///
/// Layers are applied in order, later ones overriding earlier ones:
/// 1. Defaults or a preset
/// 2. Configuration files and strings (TOML or JSON)
///
/// Keys missing from a layer keep the value of the layer below.
///
/// # Example
///
/// ```no_run
/// use restapi_config::ConfigLoader;
///
/// # fn main() -> Result<(), restapi_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_file("restapi.toml")?
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: RestApiConfig,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RestApiConfig::default(),
        }
    }

    /// Start over from the default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = RestApiConfig::default();
        self
    }

    /// Start over from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use restapi_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = RestApiConfig::development();
        self
    }

    /// Start over from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = RestApiConfig::production();
        self
    }

    /// Layer a configuration file on top.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The extension is not supported
    /// - The file contains invalid TOML/JSON or unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        let layer = Self::parse(&content, &format)?;
        self.merge(layer)?;
        Ok(self)
    }

    /// Layer a configuration file on top if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layer configuration content on top.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use restapi_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [resource]
    ///     body_read_limit = 4096
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.resource.body_read_limit, 4096);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = Self::parse(content, &format.to_lowercase())?;
        self.merge(layer)?;
        Ok(self)
    }

    /// Validate and return the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn load(self) -> Result<RestApiConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the loaded configuration without validating it.
    #[must_use]
    pub fn load_unvalidated(self) -> RestApiConfig {
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<Value, ConfigError> {
        let layer: Value = match format {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        // Reject unknown fields against the layer alone, before merging.
        let _: RestApiConfig = serde_json::from_value(layer.clone())?;
        Ok(layer)
    }

    fn merge(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut base = serde_json::to_value(&self.config)?;
        overlay(&mut base, layer);
        self.config = serde_json::from_value(base)?;
        Ok(())
    }
}

fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, RestApiConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_layer_keeps_unset_keys() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[problem]\nbase_url = \"https://errors.example.com\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(
            config.problem.base_url.as_deref(),
            Some("https://errors.example.com")
        );
        assert!(config.problem.expose_details);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"resource": {"default_mime": "application/x-ndjson"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.resource.default_mime, "application/x-ndjson");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[resource]\nbody_limit = 1", "toml");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));

        let result = ConfigLoader::new().with_string("[server]\nport = 1", "toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ConfigLoader::new().with_string("[resource", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let result = ConfigLoader::new()
            .with_string("[resource]\nbody_read_limit = 0", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[resource]\nbody_read_limit = 2048\n\n[logging]\nformat = \"pretty\""
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.resource.body_read_limit, 2048);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"problem": {{"expose_details": true}}}}"#).unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert!(config.problem.expose_details);
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/restapi.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/restapi.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, RestApiConfig::default());
    }

    #[test]
    fn test_load_unvalidated() {
        let config = ConfigLoader::new()
            .with_string("[resource]\nbody_read_limit = 0", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.resource.body_read_limit, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlay_replaces_scalars() {
        let mut base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": null});
        overlay(&mut base, serde_json::json!({"a": {"b": 3}, "d": "x"}));
        assert_eq!(base, serde_json::json!({"a": {"b": 3, "c": 2}, "d": "x"}));
    }
}
