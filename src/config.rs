//! Configuration System
//!
//! Layered client configuration. Sources, lowest to highest precedence:
//! built-in defaults, the user's global `config.toml`, the project's
//! `sitequery.toml`, then `SITEQUERY_*` environment variables
//! (nested keys separated by `__`, e.g. `SITEQUERY_RETRY__MAX_ATTEMPTS=5`).

use crate::error::QueryError;
use crate::logging::LoggingConfig;
use crate::retry::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PLATFORM_DOMAIN: &str = "wixsite.com";
pub const PROJECT_CONFIG_FILE: &str = "sitequery.toml";
pub const ENV_PREFIX: &str = "SITEQUERY";

/// Root client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Account subdomain
    #[serde(default)]
    pub account: Option<String>,

    /// Site identifier (first path segment)
    #[serde(default)]
    pub site_id: Option<String>,

    /// Shared secret sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Host suffix after the account subdomain
    #[serde(default = "default_platform_domain")]
    pub platform_domain: String,

    /// Per-attempt request deadline (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// TCP connect timeout (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retry settings as they appear in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_platform_domain() -> String {
    DEFAULT_PLATFORM_DOMAIN.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    /// Build a policy using the default retryability predicate.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account: None,
            site_id: None,
            token: None,
            platform_domain: default_platform_domain(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry: RetrySettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Platform(String),
    Timeout(String),
    Retry(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Platform(msg) => write!(f, "Platform: {}", msg),
            ValidationError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ClientConfig {
    /// Validate the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let domain = self.platform_domain.trim();
        if domain.is_empty() {
            errors.push(ValidationError::Platform(
                "platform_domain cannot be empty".to_string(),
            ));
        } else if domain.contains('/') || domain.contains("://") {
            errors.push(ValidationError::Platform(format!(
                "platform_domain must be a bare host name, got '{}'",
                domain
            )));
        }

        if self.timeout_ms == 0 {
            errors.push(ValidationError::Timeout(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            errors.push(ValidationError::Timeout(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            errors.push(ValidationError::Retry(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding all problems into a single configuration error.
    pub fn validated(self) -> Result<Self, QueryError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            QueryError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Write the configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<(), QueryError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| QueryError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QueryError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            QueryError::Config(format!("Failed to write config {}: {}", path.display(), e))
        })
    }
}

/// Loads [`ClientConfig`] from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path of the per-user config file, if a home directory can be resolved.
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sitequery").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load defaults, global file, `<project_root>/sitequery.toml` and environment.
    pub fn load(project_root: &Path) -> Result<ClientConfig, QueryError> {
        let mut builder = Self::builder_with_defaults()?;

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                debug!(config_path = %global.display(), "Loading global config");
                builder = builder.add_source(File::from(global).required(false));
            }
        }

        let project = project_root.join(PROJECT_CONFIG_FILE);
        if project.exists() {
            debug!(config_path = %project.display(), "Loading project config");
            builder = builder.add_source(File::from(project).required(false));
        }

        let config = builder.add_source(Self::environment()).build()?;
        let loaded: ClientConfig = config.try_deserialize()?;
        loaded.validated()
    }

    /// Load a single file over the defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<ClientConfig, QueryError> {
        let config = Self::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?;
        let loaded: ClientConfig = config.try_deserialize()?;
        loaded.validated()
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("platform_domain", DEFAULT_PLATFORM_DOMAIN)?
            .set_default("timeout_ms", default_timeout_ms() as i64)?
            .set_default("connect_timeout_ms", default_connect_timeout_ms() as i64)?
            .set_default("retry.max_attempts", default_max_attempts() as i64)?
            .set_default("retry.base_delay_ms", default_base_delay_ms() as i64)?
            .set_default("retry.max_delay_ms", default_max_delay_ms() as i64)
    }
}
