//! Error types for the sitequery client.

use crate::response::ApplicationError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by query building, request dispatch and response handling
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Local input rejected before any request is built
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operator name not in the recognized operator table
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    /// Well-formed `failed` response from the site
    #[error("{0}")]
    Application(ApplicationError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    /// True for errors raised locally before anything reaches the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::Validation(_) | QueryError::InvalidOperator(_)
        )
    }

    /// HTTP status carried by a protocol error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for QueryError {
    fn from(err: config::ConfigError) -> Self {
        QueryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Serialization(err.to_string())
    }
}

/// Map a reqwest failure onto the error taxonomy. A timeout is reported with the
/// deadline that fired: `connect_timeout` while connecting, `request_timeout`
/// otherwise.
pub(crate) fn map_http_error(
    error: reqwest::Error,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> QueryError {
    if error.is_timeout() {
        if error.is_connect() {
            QueryError::Timeout(connect_timeout)
        } else {
            QueryError::Timeout(request_timeout)
        }
    } else if error.is_connect() {
        QueryError::Network(format!("Connection error: {}", error))
    } else if error.is_request() || error.is_body() {
        QueryError::Network(format!("Request error: {}", error))
    } else {
        QueryError::Network(format!("HTTP error: {}", error))
    }
}
