//! Concurrency Governor
//!
//! Counting admission gate bounding simultaneous in-flight calls to the
//! cluster. A slot is held by an RAII guard, so it is returned on every exit
//! path, including errors and a caller dropping the future mid-flight.

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default maximum number of concurrent requests per client
pub const DEFAULT_MAX_CONCURRENCY: usize = 6;

/// Bounds the number of outstanding remote calls
#[derive(Debug, Clone)]
pub struct ConcurrencyGovernor {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of admission; dropping it frees the slot
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGovernor {
    /// Create a governor admitting at most `capacity` calls at once
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Configuration(
                "max concurrency must be at least 1".into(),
            ));
        }

        Ok(Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait until a slot frees up. There is no timeout.
    pub async fn acquire(&self) -> Slot {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("governor semaphore is never closed");
        Slot { _permit: permit }
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<Slot> {
        self.slots
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| Slot { _permit: permit })
    }

    /// Configured maximum
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

impl Default for ConcurrencyGovernor {
    fn default() -> Self {
        Self {
            slots: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
            capacity: DEFAULT_MAX_CONCURRENCY,
        }
    }
}
