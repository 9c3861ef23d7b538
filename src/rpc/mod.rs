//! Element JSON-RPC Layer
//!
//! - `envelope`: request encoding and response envelope classification
//! - `transport`: the swappable wire seam and its HTTP implementation
//! - `governor`: bound on in-flight calls
//! - `client`: the invoker every remote operation goes through

pub mod client;
pub mod envelope;
pub mod governor;
pub mod metrics;
pub mod transport;

pub use client::{ClientBuilder, ClientConfig, ElementClient};
pub use envelope::{basic_auth_header, decode_response, rpc_path, RpcRequest, DEFAULT_API_VERSION};
pub use governor::{ConcurrencyGovernor, Slot, DEFAULT_MAX_CONCURRENCY};
pub use metrics::{CallOutcome, RpcMetrics, RpcMetricsSnapshot};
pub use transport::{HttpTransport, HttpTransportConfig, RpcTransport};
