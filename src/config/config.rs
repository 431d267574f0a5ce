//! Configuration management for the Improvado gateway

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

fn default_host() -> String {
    crate::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    crate::DEFAULT_PORT
}

fn default_verification_url() -> String {
    "https://improvado.fyi".to_string()
}

fn default_notion_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Improvado verification and query service
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Notion content API
    #[serde(default)]
    pub notion: NotionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Improvado verification service configuration
///
/// Both `/api/gpt/verify` and `/api/gpt/query` hang off `base_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_verification_url")]
    pub base_url: String,
}

/// Notion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Versioned base path, e.g. `https://api.notion.com/v1`
    #[serde(default = "default_notion_url")]
    pub base_url: String,
    /// Value sent in the `Notion-Version` header
    #[serde(default = "default_notion_version")]
    pub version: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            base_url: default_verification_url(),
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: default_notion_url(),
            version: default_notion_version(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(GatewayError::config("Server host cannot be empty"));
        }
        if self.port == 0 {
            return Err(GatewayError::config("Server port must be greater than 0"));
        }
        Ok(())
    }
}

impl VerificationConfig {
    pub fn validate(&self) -> Result<()> {
        validate_http_url("verification.base_url", &self.base_url)
    }

    /// Endpoint that checks keys and exchanges them for downstream tokens
    pub fn verify_url(&self) -> String {
        format!("{}/api/gpt/verify", self.base_url.trim_end_matches('/'))
    }
}

impl NotionConfig {
    pub fn validate(&self) -> Result<()> {
        validate_http_url("notion.base_url", &self.base_url)?;
        if self.version.trim().is_empty() {
            return Err(GatewayError::config("notion.version cannot be empty"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(GatewayError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(GatewayError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.format,
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| GatewayError::config(format!("Invalid {} '{}': {}", field, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(GatewayError::config(format!(
            "Invalid {} '{}': unsupported scheme '{}'",
            field, value, other
        ))),
    }
}

impl Config {
    /// Load .env files in order of precedence
    fn load_env_files() {
        let env = std::env::var("IMPROVADO_ENV")
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());

        // Variables that are already set are never overwritten
        let env_specific_file = format!(".env.{}", env);
        let env_files = [".env", env_specific_file.as_str(), ".env.local"];

        for env_file in env_files {
            match dotenvy::from_filename(env_file) {
                Ok(_) => {
                    tracing::info!("Loaded environment variables from {}", env_file);
                }
                Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("No {} file found, skipping", env_file);
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", env_file, e);
                }
            }
        }

        tracing::info!("Environment: {}", env);
    }

    /// Load configuration from file with environment variables and CLI overrides
    pub fn load<P: AsRef<Path>>(
        path: P,
        host_override: Option<String>,
        port_override: Option<u16>,
    ) -> Result<Self> {
        Self::load_env_files();

        let mut config = Self::from_file(&path)?;

        // Precedence: .env < file < env < CLI
        config.apply_environment_overrides()?;

        if let Some(host) = host_override {
            config.server.host = host;
        }
        if let Some(port) = port_override {
            config.server.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a YAML config file, falling back to defaults when it does not exist
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            tracing::warn!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(host) = var("IMPROVADO_HOST") {
            self.server.host = host;
        }

        if let Some(port_str) = var("IMPROVADO_PORT") {
            self.server.port = port_str.parse().map_err(|e| {
                GatewayError::config(format!("Invalid IMPROVADO_PORT environment variable: {}", e))
            })?;
        }

        if let Some(url) = var("IMPROVADO_VERIFICATION_URL") {
            self.verification.base_url = url;
        }

        if let Some(url) = var("IMPROVADO_NOTION_URL") {
            self.notion.base_url = url;
        }

        if let Some(version) = var("IMPROVADO_NOTION_VERSION") {
            self.notion.version = version;
        }

        if let Some(level) = var("IMPROVADO_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("IMPROVADO_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.verification.validate()?;
        self.notion.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, crate::DEFAULT_PORT);
        assert_eq!(config.notion.version, "2022-06-28");
        assert_eq!(
            config.verification.verify_url(),
            "https://improvado.fyi/api/gpt/verify"
        );
    }

    #[test]
    fn test_from_file_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 9090\nverification:\n  base_url: \"http://localhost:4000/\"\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, crate::DEFAULT_HOST);
        assert_eq!(
            config.verification.verify_url(),
            "http://localhost:4000/api/gpt/verify"
        );
        assert_eq!(config.notion.base_url, "https://api.notion.com/v1");
    }

    #[test]
    fn test_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.server.port, crate::DEFAULT_PORT);
    }

    #[test]
    fn test_from_file_rejects_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [not, a, map").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("IMPROVADO_HOST", "127.0.0.1"),
                ("IMPROVADO_PORT", "8088"),
                ("IMPROVADO_NOTION_URL", "http://notion.local/v1"),
                ("IMPROVADO_LOG_FORMAT", "json"),
                ("IMPROVADO_LOG_LEVEL", ""),
            ]))
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.notion.base_url, "http://notion.local/v1");
        assert_eq!(config.logging.format, "json");
        // Empty values are ignored
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("IMPROVADO_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(err.to_string().contains("IMPROVADO_PORT"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.verification.base_url = "ftp://improvado.fyi".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.notion.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
