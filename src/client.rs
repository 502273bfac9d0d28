//! Client Entry Point
//!
//! Holds the connection identity and hands out one [`Query`] per collection. The
//! identity is immutable; every query receives its own copy.

use crate::config::{ClientConfig, DEFAULT_PLATFORM_DOMAIN};
use crate::error::QueryError;
use crate::query::Query;
use crate::retry::RetryPolicy;
use crate::transport::{
    HttpTransport, ReqwestTransport, Transport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// `(account, site_id, token)` triple
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    account: String,
    site_id: String,
    token: String,
}

impl ClientIdentity {
    /// Fails with a validation error when any part is blank.
    pub fn new(
        account: impl Into<String>,
        site_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let identity = Self {
            account: account.into(),
            site_id: site_id.into(),
            token: token.into(),
        };
        for (name, value) in [
            ("account", &identity.account),
            ("site_id", &identity.site_id),
            ("token", &identity.token),
        ] {
            if value.trim().is_empty() {
                return Err(QueryError::Validation(format!("{} cannot be empty", name)));
            }
        }
        Ok(identity)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("account", &self.account)
            .field("site_id", &self.site_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Request base address: `https://{account}.{platform_domain}/{site_id}/_functions`
pub fn base_url(account: &str, platform_domain: &str, site_id: &str) -> String {
    format!(
        "https://{}.{}/{}/_functions",
        account, platform_domain, site_id
    )
}

/// Entry point: one per site
#[derive(Clone)]
pub struct SiteClient {
    identity: ClientIdentity,
    platform_domain: String,
    http: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl SiteClient {
    /// Client with default settings and the `reqwest` transport.
    pub fn new(
        account: impl Into<String>,
        site_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let identity = ClientIdentity::new(account, site_id, token)?;
        let http = Arc::new(ReqwestTransport::new(
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_REQUEST_TIMEOUT,
        )?);
        Ok(Self {
            identity,
            platform_domain: DEFAULT_PLATFORM_DOMAIN.to_string(),
            http,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Client built entirely from configuration; identity fields are required.
    pub fn from_config(config: &ClientConfig) -> Result<Self, QueryError> {
        let config = config.clone().validated()?;
        let identity = ClientIdentity::new(
            config.account.clone().unwrap_or_default(),
            config.site_id.clone().unwrap_or_default(),
            config.token.clone().unwrap_or_default(),
        )?;
        let http = Arc::new(ReqwestTransport::new(
            config.connect_timeout(),
            config.timeout(),
        )?);
        Ok(Self {
            identity,
            platform_domain: config.platform_domain.trim().to_string(),
            http,
            retry: config.retry.to_policy(),
            timeout: config.timeout(),
        })
    }

    /// Replace the HTTP transport.
    pub fn with_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = http;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt deadline for every query this client creates.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_platform_domain(mut self, platform_domain: impl Into<String>) -> Self {
        self.platform_domain = platform_domain.into();
        self
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn base_url(&self) -> String {
        base_url(
            &self.identity.account,
            &self.platform_domain,
            &self.identity.site_id,
        )
    }

    /// New query over `collection`.
    pub fn query(&self, collection: &str) -> Result<Query, QueryError> {
        if collection.trim().is_empty() {
            return Err(QueryError::Validation(
                "collection name cannot be empty".to_string(),
            ));
        }
        let transport = Transport::new(
            self.base_url(),
            self.identity.token.clone(),
            self.http.clone(),
        )
        .with_retry_policy(self.retry.clone())
        .with_timeout(self.timeout);
        debug!(collection, base_url = %transport.base_url(), "Creating query");
        Ok(Query::new(collection, transport))
    }
}

impl std::fmt::Debug for SiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteClient")
            .field("identity", &self.identity)
            .field("platform_domain", &self.platform_domain)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}
