//! RPC Transports
//!
//! [`RpcTransport`] is the seam between the invoker and the wire. Any
//! implementation must report outcomes with the envelope taxonomy of
//! [`decode_response`]: a result value, `Error::Api`, `Error::NoResult`, or
//! a transport-level failure.

use super::envelope::{
    basic_auth_header, decode_response, rpc_path, RpcRequest, STATUS_UNAUTHORIZED,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

/// Carries one JSON-RPC request to the cluster and returns its `result`
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, request: &RpcRequest) -> Result<Value>;

    /// Short name for logs
    fn name(&self) -> &str;
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL, e.g. `https://10.0.0.5`
    pub host: String,
    pub username: String,
    pub password: String,
    pub api_version: String,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

/// JSON-RPC over HTTP POST with Basic authentication
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    authorization: String,
}

impl HttpTransport {
    /// Build the transport and its HTTP connection pool
    pub fn new(config: &HttpTransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}{}",
                config.host.trim_end_matches('/'),
                rpc_path(&config.api_version)
            ),
            authorization: basic_auth_header(&config.username, &config.password),
        })
    }

    /// Full endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, request: &RpcRequest) -> Result<Value> {
        let body = request.to_body()?;

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, &self.authorization)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        // The body of a rejected request may be cut short; don't read it
        if status == STATUS_UNAUTHORIZED {
            debug!("{} answered HTTP {}", request.method, status);
            return Err(Error::Unauthenticated);
        }

        let bytes = response.bytes().await?;
        debug!("{} answered HTTP {} ({} bytes)", request.method, status, bytes.len());

        decode_response(status, &bytes)
    }

    fn name(&self) -> &str {
        "http"
    }
}
