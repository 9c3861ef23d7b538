//! Element Reconciler - SolidFire Element storage management
//!
//! A bounded-concurrency JSON-RPC client for the Element API and the
//! create / read / update / delete / exists reconciliation of Accounts,
//! Volumes, Initiators and Volume Access Groups on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                         Resource Reconcilers                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌────────────────────┐  │
//! │  │   Account   │  │   Volume    │  │  Initiator  │  │ Volume Access Group│  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └─────────┬──────────┘  │
//! ├─────────┴────────────────┴────────────────┴───────────────────┴─────────────┤
//! │                          Entity Accessors                                    │
//! │        (typed params, exactly-one lookups, not-found classification)         │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                           Element Client                                     │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │   Concurrency   │  │   Call Metrics  │  │   Injected tracing Span     │  │
//! │  │    Governor     │  │                 │  │                             │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                    RpcTransport (HTTP POST /json-rpc/{version})              │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`rpc`]: Envelope codec, transport, concurrency governor and client
//! - [`element`]: Typed accessors per entity kind
//! - [`reconcile`]: Resource lifecycle implementations
//! - [`domain`]: Core domain types and traits
//! - [`error`]: Error types and handling

pub mod domain;
pub mod element;
pub mod error;
pub mod reconcile;
pub mod rpc;

// Re-export commonly used types
pub use domain::ports::{Attributes, EntityId, EntityKind, Resource, ResourceData, ResourceRef};

pub use element::{
    Account, Initiator, QualityOfService, Volume, VolumeAccessGroup,
};

pub use error::{ApiError, Error, ErrorAction, Result};

pub use reconcile::{
    AccessGroupFields, AccessGroupResource, AccountFields, AccountResource, InitiatorFields,
    InitiatorResource, Reconcilers, VolumeFields, VolumeResource,
};

pub use rpc::{
    ClientBuilder, ClientConfig, ConcurrencyGovernor, ElementClient, HttpTransport,
    RpcMetricsSnapshot, RpcTransport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
