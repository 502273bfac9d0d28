//! Logging System
//!
//! Structured logging through the `tracing` crate. The library only emits events;
//! applications that want them printed call [`init_logging`] once, or install their
//! own subscriber.

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is "file"
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Colored output (text format on a terminal stream only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("sitequery.log")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    File,
}

/// Install a global subscriber.
///
/// Priority order (highest to lowest):
/// 1. Environment variables (SITEQUERY_LOG, SITEQUERY_LOG_FORMAT, SITEQUERY_LOG_OUTPUT)
/// 2. The given configuration
/// 3. Defaults
///
/// Fails with [`QueryError::Config`] if a global subscriber is already set.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), QueryError> {
    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(std::sync::Mutex::new(open_log_file(config)?)),
    };
    let use_color = output != LogOutput::File && config.map(|c| c.color).unwrap_or(true);

    let registry = Registry::default().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init(),
    };

    result.map_err(|e| QueryError::Config(format!("Failed to install logger: {}", e)))
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<std::fs::File, QueryError> {
    let log_file = config
        .map(|c| c.file.clone())
        .unwrap_or_else(default_log_file);

    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QueryError::Config(format!("Failed to create log directory: {}", e))
            })?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            QueryError::Config(format!("Failed to open log file {:?}: {}", log_file, e))
        })
}

/// Build the level filter from SITEQUERY_LOG or the configuration
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, QueryError> {
    if let Ok(filter) = EnvFilter::try_from_env("SITEQUERY_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);

    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            filter = filter.add_directive(parse_directive(module, module_level)?);
        }
    }

    if let Ok(modules) = std::env::var("SITEQUERY_LOG_MODULES") {
        for spec in modules.split(',') {
            if let Some((module, module_level)) = spec.split_once('=') {
                filter = filter.add_directive(parse_directive(module, module_level)?);
            }
        }
    }

    Ok(filter)
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, QueryError> {
    format!("{}={}", module.trim(), level.trim())
        .parse()
        .map_err(|e| QueryError::Config(format!("Invalid log directive: {}", e)))
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<LogFormat, QueryError> {
    if let Ok(format) = std::env::var("SITEQUERY_LOG_FORMAT") {
        if let Ok(parsed) = parse_format(&format) {
            return Ok(parsed);
        }
    }
    parse_format(config.map(|c| c.format.as_str()).unwrap_or("text"))
}

fn parse_format(format: &str) -> Result<LogFormat, QueryError> {
    match format {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(QueryError::Config(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<LogOutput, QueryError> {
    if let Ok(output) = std::env::var("SITEQUERY_LOG_OUTPUT") {
        return parse_output(&output);
    }
    parse_output(config.map(|c| c.output.as_str()).unwrap_or("stderr"))
}

fn parse_output(output: &str) -> Result<LogOutput, QueryError> {
    match output {
        "stdout" => Ok(LogOutput::Stdout),
        "stderr" => Ok(LogOutput::Stderr),
        "file" => Ok(LogOutput::File),
        other => Err(QueryError::Config(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            other
        ))),
    }
}
