//! Installing the global subscriber with file output

use sitequery::logging::{init_logging, LoggingConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_init_logging_writes_to_configured_file() {
    for var in [
        "SITEQUERY_LOG",
        "SITEQUERY_LOG_FORMAT",
        "SITEQUERY_LOG_OUTPUT",
        "SITEQUERY_LOG_MODULES",
    ] {
        std::env::remove_var(var);
    }

    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs").join("client.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        output: "file".to_string(),
        file: log_path.clone(),
        ..LoggingConfig::default()
    };

    init_logging(Some(&config)).unwrap();
    tracing::info!(collection = "Posts", "logging smoke event");
    tracing::debug!("below the configured level");

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(
        content.contains("logging smoke event"),
        "log file should contain the event; got: {}",
        content
    );
    assert!(content.contains("collection=\"Posts\"") || content.contains("Posts"));
    assert!(!content.contains("below the configured level"));

    // a second global subscriber is refused
    let err = init_logging(Some(&config)).unwrap_err();
    assert!(matches!(err, sitequery::QueryError::Config(_)));
}
