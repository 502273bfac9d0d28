//! Request Transport
//!
//! Builds the request envelope for each collection operation, posts it to the
//! operation's fixed route through an [`HttpTransport`], and hands the raw
//! response to the normalizer. Every call runs inside the retry executor.

use crate::condition::Condition;
use crate::error::{map_http_error, QueryError};
use crate::response::normalize;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::types::{FindResult, ItemIds, Items, QueryResult, RequestOptions};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed route bound to each operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Insert,
    Save,
    Update,
    Remove,
    Truncate,
    Query,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Insert => "insertQuery",
            Route::Save => "saveQuery",
            Route::Update => "update",
            Route::Remove => "removeQuery",
            Route::Truncate => "truncateQuery",
            Route::Query => "query",
        }
    }

    pub fn url(self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.as_str())
    }
}

/// Operation-specific part of the envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Items {
        item: Items,
        options: RequestOptions,
    },
    Item {
        item: Value,
        options: RequestOptions,
    },
    ItemIds {
        #[serde(rename = "itemId")]
        item_id: ItemIds,
        options: RequestOptions,
    },
    Conditions {
        conditions: Vec<Condition>,
        options: RequestOptions,
    },
    Empty {
        options: RequestOptions,
    },
}

/// Full JSON body sent to a route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    pub collection: String,
    pub token: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON POST and returns the raw response
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, QueryError>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    client: Client,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| QueryError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            connect_timeout,
            request_timeout,
        })
    }

    fn map_error(&self, error: reqwest::Error) -> QueryError {
        map_http_error(error, self.connect_timeout, self.request_timeout)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, QueryError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_error(e))?;
        Ok(HttpResponse { status, body })
    }
}

/// Per-client dispatcher: base address, token, HTTP seam and retry settings
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    token: String,
    http: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Transport {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        http: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn insert(
        &self,
        collection: &str,
        item: Items,
        options: RequestOptions,
    ) -> Result<QueryResult<Value>, QueryError> {
        self.dispatch(Route::Insert, collection, RequestBody::Items { item, options })
            .await
    }

    pub async fn save(
        &self,
        collection: &str,
        item: Items,
        options: RequestOptions,
    ) -> Result<QueryResult<Value>, QueryError> {
        self.dispatch(Route::Save, collection, RequestBody::Items { item, options })
            .await
    }

    pub async fn update(
        &self,
        collection: &str,
        item: Value,
        options: RequestOptions,
    ) -> Result<QueryResult<Value>, QueryError> {
        self.dispatch(Route::Update, collection, RequestBody::Item { item, options })
            .await
    }

    pub async fn remove(
        &self,
        collection: &str,
        item_id: ItemIds,
        options: RequestOptions,
    ) -> Result<QueryResult<Value>, QueryError> {
        self.dispatch(
            Route::Remove,
            collection,
            RequestBody::ItemIds { item_id, options },
        )
        .await
    }

    pub async fn truncate(
        &self,
        collection: &str,
        options: RequestOptions,
    ) -> Result<QueryResult<Value>, QueryError> {
        self.dispatch(Route::Truncate, collection, RequestBody::Empty { options })
            .await
    }

    /// Query route; the `result` payload is decoded into items and pagination.
    pub async fn find<T: DeserializeOwned>(
        &self,
        collection: &str,
        conditions: Vec<Condition>,
        options: RequestOptions,
    ) -> Result<QueryResult<FindResult<T>>, QueryError> {
        let result = self
            .dispatch(
                Route::Query,
                collection,
                RequestBody::Conditions {
                    conditions,
                    options,
                },
            )
            .await?;

        match result {
            QueryResult::Success(payload) => {
                let found: FindResult<T> = serde_json::from_value(payload).map_err(|e| {
                    QueryError::MalformedResponse(format!("Invalid query result payload: {}", e))
                })?;
                Ok(QueryResult::Success(found))
            }
            QueryResult::Failure(err) => Ok(QueryResult::Failure(err)),
        }
    }

    async fn dispatch(
        &self,
        route: Route,
        collection: &str,
        body: RequestBody,
    ) -> Result<QueryResult<Value>, QueryError> {
        let envelope = RequestEnvelope {
            collection: collection.to_string(),
            token: self.token.clone(),
            body,
        };
        let payload = serde_json::to_value(&envelope)?;
        let url = route.url(&self.base_url);
        let http = &self.http;

        let result = run_with_retry(&self.retry, self.timeout, |attempt| {
            let url = url.as_str();
            let payload = &payload;
            async move {
                debug!(route = route.as_str(), collection, attempt, "Sending request");
                let response = http.post_json(url, payload).await?;
                interpret_response(response)
            }
        })
        .await?;

        if let QueryResult::Failure(err) = &result {
            info!(
                route = route.as_str(),
                collection,
                code = %err.code,
                "Request rejected by site"
            );
        }
        Ok(result)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Classify a raw response. A well-formed `failed` envelope is an application
/// failure whatever the HTTP status; any other non-2xx response becomes
/// [`QueryError::Http`], retryable only for 408, 429 and 5xx.
pub fn interpret_response(response: HttpResponse) -> Result<QueryResult<Value>, QueryError> {
    if response.is_success() {
        return normalize(&response.body);
    }
    if let Ok(failure @ QueryResult::Failure(_)) = normalize(&response.body) {
        return Ok(failure);
    }
    Err(QueryError::Http {
        status: response.status,
        body: response.body,
    })
}
