//! Response Normalizer
//!
//! Turns a raw response body into a [`QueryResult`]. The `status` discriminator is
//! checked strictly: a missing, non-string or unrecognized status is a malformed
//! response, never coerced. Successful payloads pass through untouched.

use crate::error::QueryError;
use crate::types::QueryResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILED: &str = "failed";

/// Known backend error codes and their stable messages
const ERROR_MESSAGES: [(&str, &str); 8] = [
    ("unauthorized", "The request token was rejected by the site"),
    ("collection_not_provided", "No collection name was provided"),
    ("collection_not_found", "The collection schema does not exist"),
    ("permission_denied", "Permission denied for this collection operation"),
    ("invalid_operator", "The query contains an unsupported operator"),
    ("invalid_query", "The query is invalid"),
    ("item_not_found", "The requested item does not exist"),
    ("operation_failed", "The collection operation failed"),
];

/// Application-level failure reported by the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationError {
    /// Raw backend error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// `errorMessage` payload as sent, string or object
    pub detail: Option<Value>,
}

impl ApplicationError {
    pub fn new(code: impl Into<String>, detail: Option<Value>) -> Self {
        let code = code.into();
        Self {
            message: message_for_code(&code),
            code,
            detail,
        }
    }

    /// Whether the code is one of the recognized backend codes.
    pub fn is_known(&self) -> bool {
        ERROR_MESSAGES.iter().any(|(code, _)| *code == self.code)
    }
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Stable message for a backend error code.
pub fn message_for_code(code: &str) -> String {
    ERROR_MESSAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| format!("Request failed with error code '{}'", code))
}

/// Parse and normalize a raw response body.
pub fn normalize(body: &str) -> Result<QueryResult<Value>, QueryError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        QueryError::MalformedResponse(format!("Response body is not valid JSON: {}", e))
    })?;
    normalize_value(value)
}

/// Normalize an already-parsed response body.
pub fn normalize_value(body: Value) -> Result<QueryResult<Value>, QueryError> {
    let Value::Object(mut envelope) = body else {
        return Err(QueryError::MalformedResponse(
            "Response body is not a JSON object".to_string(),
        ));
    };

    let status = match envelope.get("status") {
        None => {
            return Err(QueryError::MalformedResponse(
                "Response is missing the 'status' field".to_string(),
            ))
        }
        Some(Value::String(status)) => status.clone(),
        Some(other) => {
            return Err(QueryError::MalformedResponse(format!(
                "Response 'status' must be a string, got {}",
                other
            )))
        }
    };

    match status.as_str() {
        STATUS_SUCCESS => Ok(QueryResult::Success(
            envelope.remove("result").unwrap_or(Value::Null),
        )),
        STATUS_FAILED => {
            let code = match envelope.remove("error") {
                Some(Value::String(code)) => code,
                Some(other) => {
                    return Err(QueryError::MalformedResponse(format!(
                        "Failed response 'error' must be a string, got {}",
                        other
                    )))
                }
                None => {
                    return Err(QueryError::MalformedResponse(
                        "Failed response is missing the 'error' field".to_string(),
                    ))
                }
            };
            let detail = envelope.remove("errorMessage").filter(|d| !d.is_null());
            Ok(QueryResult::Failure(ApplicationError::new(code, detail)))
        }
        other => Err(QueryError::MalformedResponse(format!(
            "Unrecognized response status '{}'",
            other
        ))),
    }
}
