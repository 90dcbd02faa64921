use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use url::Url;

/// Directory name used under the platform config dir
const APP_DIR_NAME: &str = "twmap";

/// Placeholder written to fresh config files until a real key is supplied
const API_KEY_PLACEHOLDER: &str = "YOUR_CWA_API_KEY";

/// Environment variable that overrides `forecast.api_key` at load time
pub const API_KEY_ENV: &str = "CWA_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Forecast feed settings
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Local forecast store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dashboard listener
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings handed to the forecast provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// CWA open data authorization key
    pub api_key: String,

    /// Open data host, without the dataset path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Skip TLS certificate verification for the forecast feed.
    ///
    /// WARNING: defaults to `true`, so certificates are not checked unless
    /// this is set to `false`.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// Transport timeout for the single forecast request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://opendata.cwa.gov.tw".to_string()
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl ForecastConfig {
    /// Check if an API key is configured (not the placeholder)
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != API_KEY_PLACEHOLDER
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            base_url: default_base_url(),
            accept_invalid_certs: default_accept_invalid_certs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings handed to the forecast store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the forecast table.
    /// Relative paths are resolved against the config directory.
    pub store_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data.db"),
        }
    }
}

impl StorageConfig {
    /// Absolute location of the store file
    pub fn resolve(&self, config_dir: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            config_dir.join(&self.store_path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface the dashboard binds to
    pub bind_address: String,

    /// Dashboard port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl ServerConfig {
    /// Parse the configured listener address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.bind_address))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            forecast: ForecastConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, writing defaults when absent.
    ///
    /// `CWA_API_KEY`, when set, replaces the API key in memory only.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Read the file as written, without environment overrides
    fn load_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Use `key` as the API key when it is non-empty. Never persisted.
    fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.forecast.api_key = key;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.forecast.base_url, "forecast.base_url", &mut result);

        if !self.forecast.is_configured() {
            result.add_warning(
                "forecast.api_key",
                "CWA API key not configured - refresh will be rejected by the feed",
            );
        }

        if self.forecast.accept_invalid_certs {
            result.add_warning(
                "forecast.accept_invalid_certs",
                "TLS certificate verification is disabled for the forecast feed",
            );
        }

        if self.forecast.timeout_secs == 0 {
            result.add_error("forecast.timeout_secs", "Timeout must be greater than 0");
        } else if self.forecast.timeout_secs > 600 {
            result.add_warning(
                "forecast.timeout_secs",
                "Timeout is unusually large (>600 seconds)",
            );
        }

        if self.storage.store_path.as_os_str().is_empty() {
            result.add_error("storage.store_path", "Store path must not be empty");
        }

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }
        if let Err(e) = self.server.socket_addr() {
            result.add_error("server.bind_address", e.to_string());
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Absolute path of the forecast store file
    pub fn store_path(&self) -> PathBuf {
        self.storage.resolve(&self.config_dir)
    }

    /// Write the configuration file
    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.forecast.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "forecast.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.forecast.base_url = "ftp://opendata.cwa.gov.tw".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_placeholder_api_key_is_warning() {
        let mut config = Config::default();
        config.forecast.api_key = API_KEY_PLACEHOLDER.to_string();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "forecast.api_key"));
    }

    #[test]
    fn test_tls_bypass_is_flagged() {
        let config = Config::default();
        assert!(config.forecast.accept_invalid_certs);
        let result = config.validate();
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "forecast.accept_invalid_certs"));
    }

    #[test]
    fn test_zero_port_and_bad_address() {
        let mut config = Config::default();
        config.server.port = 0;
        config.server.bind_address = "localhost:80".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "server.port"));
        assert!(result.errors.iter().any(|e| e.field == "server.bind_address"));
    }

    #[test]
    fn test_store_path_resolution() {
        let storage = StorageConfig::default();
        assert_eq!(
            storage.resolve(Path::new("/tmp/twmap")),
            PathBuf::from("/tmp/twmap/data.db")
        );

        let absolute = StorageConfig {
            store_path: PathBuf::from("/var/lib/twmap/forecast.db"),
        };
        assert_eq!(
            absolute.resolve(Path::new("/tmp/twmap")),
            PathBuf::from("/var/lib/twmap/forecast.db")
        );
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.store_path(), dir.path().join("data.db"));

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.server.port, 8501);
        assert_eq!(reloaded.forecast.base_url, config.forecast.base_url);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/twmap\"\n\n[forecast]\napi_key = \"CWA-TEST\"\n",
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.forecast.api_key, "CWA-TEST");
        assert!(config.forecast.is_configured());
        assert_eq!(config.forecast.timeout_secs, 30);
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_env_key_overrides_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        // First run writes the placeholder
        let first = Config::load_file(&path).unwrap();
        assert!(!first.forecast.is_configured());

        let mut second = Config::load_file(&path).unwrap();
        second.apply_api_key_override(Some("CWA-REAL-KEY".to_string()));
        assert_eq!(second.forecast.api_key, "CWA-REAL-KEY");
        assert!(second.forecast.is_configured());

        // The key is not written back
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains(API_KEY_PLACEHOLDER));
        assert!(!on_disk.contains("CWA-REAL-KEY"));
    }

    #[test]
    fn test_empty_env_key_keeps_file_value() {
        let mut config = Config::default();
        config.forecast.api_key = "CWA-FILE-KEY".to_string();

        config.apply_api_key_override(Some("  ".to_string()));
        assert_eq!(config.forecast.api_key, "CWA-FILE-KEY");

        config.apply_api_key_override(None);
        assert_eq!(config.forecast.api_key, "CWA-FILE-KEY");
    }

    #[test]
    fn test_default_key_is_placeholder() {
        assert_eq!(ForecastConfig::default().api_key, API_KEY_PLACEHOLDER);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
