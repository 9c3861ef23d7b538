//! RPC Metrics
//!
//! Lock-free counters for remote calls made through one client.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a single remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// `result` returned
    Success,
    /// Named application error returned by the cluster
    ApiError,
    /// Transport, authentication or envelope failure
    Failure,
}

/// Counters for one client instance
#[derive(Debug, Default)]
pub struct RpcMetrics {
    /// Calls dispatched
    pub calls: AtomicU64,
    /// Calls that returned a result
    pub successes: AtomicU64,
    /// Calls that returned an application error
    pub api_errors: AtomicU64,
    /// Calls that failed below the application layer
    pub failures: AtomicU64,
    /// Calls currently on the wire
    pub in_flight: AtomicU64,
    /// Highest in-flight count observed
    pub peak_in_flight: AtomicU64,
}

impl RpcMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call being dispatched. The in-flight count drops again when
    /// the returned tracker is dropped, even if the call never finishes.
    #[inline]
    pub fn start(&self) -> CallTracker<'_> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        CallTracker { metrics: self }
    }

    #[inline]
    fn record_outcome(&self, outcome: CallOutcome) {
        let counter = match outcome {
            CallOutcome::Success => &self.successes,
            CallOutcome::ApiError => &self.api_errors,
            CallOutcome::Failure => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> RpcMetricsSnapshot {
        RpcMetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            api_errors: self.api_errors.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

/// Tracks one in-flight call
#[must_use]
pub struct CallTracker<'a> {
    metrics: &'a RpcMetrics,
}

impl CallTracker<'_> {
    /// Record how the call ended
    pub fn finish(self, outcome: CallOutcome) {
        self.metrics.record_outcome(outcome);
    }
}

impl Drop for CallTracker<'_> {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcMetricsSnapshot {
    pub calls: u64,
    pub successes: u64,
    pub api_errors: u64,
    pub failures: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
}
