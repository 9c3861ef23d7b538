//! JSON-RPC Envelope Codec
//!
//! Builds the authenticated request body and classifies the response
//! envelope into success, application error, or malformed.

use crate::error::{ApiError, Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "1.0";

/// Base path every JSON-RPC request is posted to
pub const RPC_BASE_PATH: &str = "/json-rpc";

/// HTTP status that short-circuits envelope decoding
pub const STATUS_UNAUTHORIZED: u16 = 401;

// =============================================================================
// Request
// =============================================================================

/// A named remote operation with its parameter object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub method: String,
    /// Always an object on the wire, never null
    pub params: Map<String, Value>,
}

impl RpcRequest {
    /// Build a request from any serializable parameter struct
    pub fn new<P: Serialize + ?Sized>(method: &str, params: Option<&P>) -> Result<Self> {
        let params = match params {
            None => Map::new(),
            Some(p) => match serde_json::to_value(p)? {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    return Err(Error::Validation(format!(
                        "{} parameters must serialize to an object, got {}",
                        method,
                        json_type(&other)
                    )))
                }
            },
        };

        Ok(Self {
            method: method.to_string(),
            params,
        })
    }

    /// Encode the request body
    pub fn to_body(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Path for the configured API version, e.g. `/json-rpc/1.0`
pub fn rpc_path(api_version: &str) -> String {
    let version = if api_version.is_empty() {
        DEFAULT_API_VERSION
    } else {
        api_version
    };
    format!("{}/{}", RPC_BASE_PATH, version)
}

/// `Authorization` header value for HTTP Basic authentication
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!("Basic {}", STANDARD.encode(credentials))
}

// =============================================================================
// Response
// =============================================================================

/// Raw response envelope
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// Classify an HTTP response into the envelope taxonomy.
///
/// A 401 is reported before the body is looked at. An `error` member wins
/// over `result`; a body carrying neither is a protocol violation.
pub fn decode_response(status: u16, body: &[u8]) -> Result<Value> {
    if status == STATUS_UNAUTHORIZED {
        return Err(Error::Unauthenticated);
    }

    let envelope: Envelope = serde_json::from_slice(body)?;

    if let Some(error) = envelope.error {
        return Err(Error::Api(error));
    }

    // `"result": null` deserializes to None and counts as missing
    envelope.result.ok_or(Error::NoResult)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Copy of `params` with secret-bearing members masked, for logging
pub fn redact(params: &Map<String, Value>) -> Value {
    const SECRET_KEYS: &[&str] = &["initiatorSecret", "targetSecret", "password"];

    fn walk(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        if SECRET_KEYS.contains(&k.as_str()) {
                            (k.clone(), Value::String("***".into()))
                        } else {
                            (k.clone(), walk(v))
                        }
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(walk).collect()),
            other => other.clone(),
        }
    }

    walk(&Value::Object(params.clone()))
}
