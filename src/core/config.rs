//! Configuration management for the server.
//!
//! Configuration is read from a TOML file whose table names mirror the
//! capability statement vocabulary (`[capability-statement]`,
//! `[search-parameters.<Type>.<name>]`), with environment variables layered
//! on top for deployment overrides.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::Result;

/// Main configuration structure for the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Values surfaced in the capability statement.
    pub capability_statement: CapabilityConfig,

    /// Extension search parameters, keyed by resource type and then by
    /// parameter name.
    pub search_parameters: BTreeMap<String, BTreeMap<String, SearchParameterConfig>>,

    /// HTTP listener configuration.
    pub http: HttpConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Capability statement configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CapabilityConfig {
    /// Publisher named in the capability statement; omitted when unset.
    pub publisher: Option<String>,
}

/// One configured extension search parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchParameterConfig {
    /// FHIR search parameter type, e.g. `string` or `reference`.
    #[serde(rename = "type")]
    pub value_type: String,

    /// Human-readable documentation for the parameter.
    pub description: String,

    /// Canonical definition URI.
    pub uri: String,

    /// Whether the parameter is advertised in the capability statement.
    /// A parameter left out of the statement still works for filtering.
    #[serde(default)]
    pub include_in_capability_statement: bool,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Whether to add a permissive CORS layer.
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load configuration from the environment.
    ///
    /// `FHIRFORGE_CONFIG` names a TOML file to start from; without it the
    /// defaults apply. Individual values can then be overridden with
    /// `FHIRFORGE_HOST`, `FHIRFORGE_PORT`, `FHIRFORGE_LOG_LEVEL`, and
    /// `FHIRFORGE_PUBLISHER`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("FHIRFORGE_CONFIG") {
            Ok(path) => {
                info!(path = %path, "loading configuration file");
                Self::from_file(path)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(host) = std::env::var("FHIRFORGE_HOST") {
            config.http.host = host;
        }

        if let Ok(port) = std::env::var("FHIRFORGE_PORT") {
            match port.parse() {
                Ok(port) => config.http.port = port,
                Err(_) => warn!(value = %port, "ignoring non-numeric FHIRFORGE_PORT"),
            }
        }

        if let Ok(level) = std::env::var("FHIRFORGE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(publisher) = std::env::var("FHIRFORGE_PUBLISHER") {
            config.capability_statement.publisher = Some(publisher);
        }

        Ok(config)
    }

    /// Look up a configured extension search parameter.
    pub fn search_parameter(
        &self,
        resource_type: &str,
        name: &str,
    ) -> Option<&SearchParameterConfig> {
        self.search_parameters.get(resource_type)?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const CONFIG_FILE: &str = r#"
[capability-statement]
publisher = "Publisher"

[search-parameters.Patient.nickname]
type = "string"
description = "Nickname"
uri = "https://hostname/nickname"
include-in-capability-statement = true
"#;

    #[test]
    fn test_parses_config_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), CONFIG_FILE).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(
            config.capability_statement.publisher.as_deref(),
            Some("Publisher")
        );

        let nickname = config.search_parameter("Patient", "nickname").unwrap();
        assert_eq!(nickname.value_type, "string");
        assert_eq!(nickname.description, "Nickname");
        assert_eq!(nickname.uri, "https://hostname/nickname");
        assert!(nickname.include_in_capability_statement);
    }

    #[test]
    fn test_include_flag_defaults_to_false() {
        let raw = r#"
[search-parameters.Patient.nickname]
type = "string"
description = "Nickname"
uri = "https://hostname/nickname"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        let nickname = config.search_parameter("Patient", "nickname").unwrap();
        assert!(!nickname.include_in_capability_statement);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 8080);
        assert!(!config.http.enable_cors);
        assert_eq!(config.logging.level, "info");
        assert!(config.capability_statement.publisher.is_none());
        assert!(config.search_parameters.is_empty());
        assert!(config.search_parameter("Patient", "nickname").is_none());
    }

    #[test]
    fn test_env_overrides() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("FHIRFORGE_HOST", "0.0.0.0");
            std::env::set_var("FHIRFORGE_PORT", "9090");
            std::env::set_var("FHIRFORGE_LOG_LEVEL", "debug");
            std::env::set_var("FHIRFORGE_PUBLISHER", "Example Corp");
        }
        let config = Config::from_env().unwrap();
        unsafe {
            std::env::remove_var("FHIRFORGE_HOST");
            std::env::remove_var("FHIRFORGE_PORT");
            std::env::remove_var("FHIRFORGE_LOG_LEVEL");
            std::env::remove_var("FHIRFORGE_PUBLISHER");
        }

        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.capability_statement.publisher.as_deref(),
            Some("Example Corp")
        );
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("FHIRFORGE_PORT", "not-a-port");
        }
        let config = Config::from_env().unwrap();
        unsafe {
            std::env::remove_var("FHIRFORGE_PORT");
        }
        assert_eq!(config.http.port, 8080);
    }
}
