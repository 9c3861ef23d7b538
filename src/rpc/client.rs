//! Element Client
//!
//! The single choke point every remote operation goes through. Composes a
//! transport with the concurrency governor, logs each call under the
//! caller-supplied span, and tags failures with the method name.

use super::envelope::{redact, RpcRequest, DEFAULT_API_VERSION};
use super::governor::{ConcurrencyGovernor, DEFAULT_MAX_CONCURRENCY};
use super::metrics::{CallOutcome, RpcMetrics, RpcMetricsSnapshot};
use super::transport::{HttpTransport, HttpTransportConfig, RpcTransport};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, Instrument, Span};

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings supplied by the caller
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Cluster management address; `https://` is assumed without a scheme
    pub host: String,
    /// Cluster admin user
    pub username: String,
    /// Cluster admin password
    pub password: String,
    /// Element API version segment
    pub api_version: String,
    /// Maximum in-flight requests, 6 when unset
    pub max_concurrency: Option<usize>,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_concurrency: None,
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    /// Host with a scheme, defaulting to HTTPS
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.clone()
        } else {
            format!("https://{}", self.host)
        }
    }

    /// API version, falling back to the default when blank
    pub fn api_version(&self) -> &str {
        if self.api_version.is_empty() {
            DEFAULT_API_VERSION
        } else {
            &self.api_version
        }
    }

    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Configuration("host is required".into()));
        }
        if self.username.is_empty() {
            return Err(Error::Configuration("username is required".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Two-phase construction: everything shared is created in [`build`](Self::build)
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn RpcTransport>>,
    span: Option<Span>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            span: None,
        }
    }

    /// Use a custom transport instead of HTTP
    pub fn transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Span every call is logged under; the caller owns the subscriber
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Create the slot pool and transport. No call can be dispatched
    /// before this returns.
    pub fn build(self) -> Result<ElementClient> {
        let capacity = self.config.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY);
        let governor = ConcurrencyGovernor::new(capacity)?;

        let transport: Arc<dyn RpcTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                self.config.validate()?;
                Arc::new(HttpTransport::new(&HttpTransportConfig {
                    host: self.config.base_url(),
                    username: self.config.username.clone(),
                    password: self.config.password.clone(),
                    api_version: self.config.api_version().to_string(),
                    accept_invalid_certs: self.config.accept_invalid_certs,
                })?)
            }
        };

        let span = self.span.unwrap_or_else(|| {
            tracing::debug_span!("element", host = %self.config.host)
        });

        debug!(
            "Element client ready: transport={}, max_concurrency={}",
            transport.name(),
            capacity
        );

        Ok(ElementClient {
            inner: Arc::new(ClientInner {
                api_version: self.config.api_version().to_string(),
                transport,
                governor,
                metrics: RpcMetrics::new(),
                span,
            }),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

struct ClientInner {
    api_version: String,
    transport: Arc<dyn RpcTransport>,
    governor: ConcurrencyGovernor,
    metrics: RpcMetrics,
    span: Span,
}

/// Bounded-concurrency Element API client. Cheap to clone.
#[derive(Clone)]
pub struct ElementClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ElementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementClient")
            .field("transport", &self.inner.transport.name())
            .field("api_version", &self.inner.api_version)
            .field("governor", &self.inner.governor)
            .finish()
    }
}

impl ElementClient {
    /// Start building a client
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Call any Element API method, returning the raw `result` value.
    ///
    /// `None` params are sent as an empty object. Errors are wrapped with
    /// the method name.
    pub async fn call_api_method<P>(&self, method: &str, params: Option<&P>) -> Result<Value>
    where
        P: Serialize + ?Sized + Sync,
    {
        let request =
            RpcRequest::new(method, params).map_err(|e| Error::rpc(method, e))?;

        self.dispatch(request)
            .instrument(self.inner.span.clone())
            .await
            .map_err(|e| Error::rpc(method, e))
    }

    /// Call a method with typed params and decode its result
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let value = self.call_api_method(method, Some(params)).await?;
        serde_json::from_value(value).map_err(|e| Error::rpc(method, e.into()))
    }

    async fn dispatch(&self, request: RpcRequest) -> Result<Value> {
        let inner = &self.inner;

        // Released on drop, whatever happens below
        let _slot = inner.governor.acquire().await;

        debug!(
            method = %request.method,
            params = %redact(&request.params),
            "Calling API"
        );

        let tracker = inner.metrics.start();
        let result = inner.transport.call(&request).await;

        tracker.finish(match &result {
            Ok(_) => CallOutcome::Success,
            Err(Error::Api(_)) => CallOutcome::ApiError,
            Err(_) => CallOutcome::Failure,
        });

        match &result {
            Ok(_) => debug!(method = %request.method, "Received successful API response"),
            Err(e) => debug!(method = %request.method, error = %e, "API call failed"),
        }

        result
    }

    /// API version segment in use
    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    /// Configured concurrency bound
    pub fn max_concurrency(&self) -> usize {
        self.inner.governor.capacity()
    }

    /// Calls currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.inner.governor.in_flight()
    }

    /// Call counters
    pub fn metrics(&self) -> RpcMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}
