//! Sitequery: fluent client for headless site collection endpoints
//!
//! Chained condition calls are recorded by a [`Query`], serialized into a JSON
//! envelope, and posted to the site's `_functions` routes with per-attempt
//! timeouts and bounded exponential-backoff retries. Responses are normalized into
//! a [`QueryResult`].
//!
//! ```no_run
//! # async fn run() -> Result<(), sitequery::QueryError> {
//! let client = sitequery::SiteClient::new("acme", "shop", "t1")?;
//! let posts = client
//!     .query("Posts")?
//!     .eq("status", "published")
//!     .limit(10)?
//!     .find()
//!     .await?
//!     .into_result()?;
//! println!("{} posts", posts.items.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod response;
pub mod retry;
pub mod transport;
pub mod types;

// Serializes tests that touch SITEQUERY_* environment variables
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

pub use client::{ClientIdentity, SiteClient};
pub use condition::{Condition, ConditionSet, Field, Operator, OperatorKind};
pub use config::{ClientConfig, ConfigLoader, RetrySettings};
pub use error::QueryError;
pub use query::Query;
pub use response::ApplicationError;
pub use retry::{is_retryable_error, run_with_retry, RetryPolicy};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, Route};
pub use types::{FindResult, ItemIds, Items, Pagination, QueryResult, RequestOptions};
