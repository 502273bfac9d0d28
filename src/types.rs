//! Wire and result types shared across the client.

use crate::error::QueryError;
use crate::response::ApplicationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a terminal operation: exactly one variant is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Success(T),
    Failure(ApplicationError),
}

impl<T> QueryResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            QueryResult::Success(value) => Some(value),
            QueryResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ApplicationError> {
        match self {
            QueryResult::Success(_) => None,
            QueryResult::Failure(err) => Some(err),
        }
    }

    /// Collapse into a `Result`, turning an application failure into an error.
    pub fn into_result(self) -> Result<T, QueryError> {
        match self {
            QueryResult::Success(value) => Ok(value),
            QueryResult::Failure(err) => Err(QueryError::Application(err)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        match self {
            QueryResult::Success(value) => QueryResult::Success(f(value)),
            QueryResult::Failure(err) => QueryResult::Failure(err),
        }
    }
}

/// Pagination block returned by the query route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub current_page: u64,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_prev_page: bool,
}

/// Successful `find` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindResult<T = Value> {
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> FindResult<T> {
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .map(|p| p.has_next_page)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-request options forwarded to the site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// Bypass collection permission checks (default: unset, site decides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_auth: Option<bool>,
    /// Skip data hooks registered on the collection (default: unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_hooks: Option<bool>,
}

/// One item or a batch of items for insert/save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    One(Value),
    Many(Vec<Value>),
}

impl From<Value> for Items {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Items::Many(items),
            other => Items::One(other),
        }
    }
}

impl From<Vec<Value>> for Items {
    fn from(items: Vec<Value>) -> Self {
        Items::Many(items)
    }
}

/// One item id or a batch of ids for remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemIds {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for ItemIds {
    fn from(id: &str) -> Self {
        ItemIds::One(id.to_string())
    }
}

impl From<String> for ItemIds {
    fn from(id: String) -> Self {
        ItemIds::One(id)
    }
}

impl From<Vec<String>> for ItemIds {
    fn from(ids: Vec<String>) -> Self {
        ItemIds::Many(ids)
    }
}

impl From<Vec<&str>> for ItemIds {
    fn from(ids: Vec<&str>) -> Self {
        ItemIds::Many(ids.into_iter().map(str::to_string).collect())
    }
}

impl ItemIds {
    /// No ids at all: an empty batch.
    pub fn is_empty(&self) -> bool {
        match self {
            ItemIds::One(_) => false,
            ItemIds::Many(ids) => ids.is_empty(),
        }
    }

    /// At least one id is blank.
    pub fn has_blank(&self) -> bool {
        match self {
            ItemIds::One(id) => id.trim().is_empty(),
            ItemIds::Many(ids) => ids.iter().any(|id| id.trim().is_empty()),
        }
    }
}
