//! Error types for the Element reconciler
//!
//! Separates the four failure families a caller has to tell apart:
//! transport failures, malformed response envelopes, application errors
//! reported by the cluster, and local validation failures raised before
//! anything goes on the wire.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Symbolic error names the cluster uses when an entity does not exist
pub const NOT_FOUND_ERROR_NAMES: &[&str] = &[
    "xUnknown",
    "xUnknownAccount",
    "xUnknownVolume",
    "xVolumeIDDoesNotExist",
    "xUnknownInitiator",
    "xUnknownVolumeAccessGroup",
];

// =============================================================================
// Application Error
// =============================================================================

/// Application error carried in the `error` member of a response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Numeric error code
    #[serde(default)]
    pub code: i64,
    /// Human readable message
    #[serde(default)]
    pub message: String,
    /// Symbolic name, the key callers dispatch on
    #[serde(default)]
    pub name: String,
}

impl ApiError {
    /// Whether the symbolic name marks an unknown entity
    pub fn is_not_found(&self) -> bool {
        NOT_FOUND_ERROR_NAMES.contains(&self.name.as_str())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {}): {}", self.name, self.code, self.message)
    }
}

// =============================================================================
// Error
// =============================================================================

/// Unified error type for the client and reconcilers
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthenticated: the cluster rejected the supplied credentials")]
    Unauthenticated,

    // =========================================================================
    // Envelope Errors
    // =========================================================================
    #[error("No result returned in JSON-RPC response")]
    NoResult,

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    // =========================================================================
    // Application Errors
    // =========================================================================
    #[error("Request returned an error: {0}")]
    Api(ApiError),

    // =========================================================================
    // Accessor Errors
    // =========================================================================
    #[error("Expected one {kind} to be found, response contained {count} results")]
    UnexpectedCount { kind: String, count: usize },

    #[error("Unable to find Volume Access Groups with the ID of {0:?}")]
    GroupsNotFound(Vec<i64>),

    #[error("{method} response did not carry the new {kind} ID")]
    MissingId { method: String, kind: String },

    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Context
    // =========================================================================
    #[error("{method} request failed: {source}")]
    Rpc {
        method: String,
        #[source]
        source: Box<Error>,
    },
}

/// Action the external driver should take after a failed reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Requeue after specific duration
    RequeueAfter(Duration),
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Wrap an error with the name of the remote operation that produced it
    pub fn rpc(method: impl Into<String>, source: Error) -> Self {
        Error::Rpc {
            method: method.into(),
            source: Box::new(source),
        }
    }

    /// Strip any operation context and return the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::Rpc { source, .. } => source.root(),
            other => other,
        }
    }

    /// Application error reported by the cluster, if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self.root() {
            Error::Api(api) => Some(api),
            _ => None,
        }
    }

    /// Whether this error means the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            Error::Api(api) => api.is_not_found(),
            Error::UnexpectedCount { count, .. } => *count == 0,
            Error::GroupsNotFound(_) => true,
            _ => false,
        }
    }

    /// Determine what action the driver should take for this error
    pub fn action(&self) -> ErrorAction {
        match self.root() {
            // Transient errors - retry with backoff
            Error::Http(_) => ErrorAction::RequeueWithBackoff,

            // Protocol inconsistency - give the cluster time to settle
            Error::UnexpectedCount { count, .. } if *count > 1 => {
                ErrorAction::RequeueAfter(Duration::from_secs(60))
            }

            // Credentials and local input need a human
            Error::Unauthenticated
            | Error::Validation(_)
            | Error::Configuration(_) => ErrorAction::NoRequeue,

            _ => ErrorAction::RequeueWithBackoff,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(self.root(), Error::Http(_))
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(name: &str) -> Error {
        Error::Api(ApiError {
            code: 500,
            message: "boom".into(),
            name: name.into(),
        })
    }

    #[test]
    fn test_not_found_classification() {
        assert!(api("xUnknownAccount").is_not_found());
        assert!(api("xUnknown").is_not_found());
        assert!(!api("xPermissionDenied").is_not_found());

        let empty = Error::UnexpectedCount {
            kind: "Volume".into(),
            count: 0,
        };
        assert!(empty.is_not_found());

        let duplicate = Error::UnexpectedCount {
            kind: "Volume".into(),
            count: 2,
        };
        assert!(!duplicate.is_not_found());
        assert!(Error::GroupsNotFound(vec![3]).is_not_found());
    }

    #[test]
    fn test_context_is_transparent() {
        let err = Error::rpc("GetAccountByID", api("xUnknownAccount"));
        assert!(err.is_not_found());
        assert_eq!(err.api_error().map(|a| a.name.as_str()), Some("xUnknownAccount"));
        assert!(err.to_string().starts_with("GetAccountByID request failed"));
    }

    #[test]
    fn test_error_actions() {
        assert_eq!(Error::Unauthenticated.action(), ErrorAction::NoRequeue);
        assert_eq!(
            Error::Validation("name argument is required".into()).action(),
            ErrorAction::NoRequeue
        );
        assert_eq!(
            Error::UnexpectedCount {
                kind: "Initiator".into(),
                count: 3
            }
            .action(),
            ErrorAction::RequeueAfter(Duration::from_secs(60))
        );
        assert!(Error::NoResult.is_retryable());
        assert!(!Error::NoResult.is_transient());
        assert!(!Error::Configuration("bad".into()).is_retryable());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError {
            code: 500,
            message: "Account 7 does not exist.".into(),
            name: "xUnknownAccount".into(),
        };
        assert_eq!(
            err.to_string(),
            "xUnknownAccount (code 500): Account 7 does not exist."
        );
    }
}
