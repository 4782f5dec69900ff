//! Admission gate bounding concurrent fetches
//!
//! The gate owns a fixed number of slots. The request path uses the
//! non-blocking [`AdmissionGate::is_saturated`] / [`AdmissionGate::try_enter`]
//! checks for fast client feedback, while the background worker performs the
//! blocking [`AdmissionGate::enter`] which is the actual enforcement point.
//!
//! A [`GateSlot`] releases its permit when dropped, so every exit path of the
//! holder (return, `?`, panic unwind) gives the slot back exactly once.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("admission gate is closed")]
    Closed,
}

/// Counting concurrency limiter shared between the HTTP layer and workers.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of permission to run a fetch. Released on drop.
#[derive(Debug)]
pub struct GateSlot {
    _permit: OwnedSemaphorePermit,
}

impl GateSlot {
    /// Give the slot back explicitly. Equivalent to dropping it.
    pub fn exit(self) {}
}

impl AdmissionGate {
    /// Creates a gate with `capacity` slots, clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// True iff every slot is currently held. Advisory only: the answer may be
    /// stale by the time the caller acts on it.
    pub fn is_saturated(&self) -> bool {
        self.available() == 0
    }

    /// Reserves a slot without waiting.
    pub fn try_enter(&self) -> Option<GateSlot> {
        match self.slots.clone().try_acquire_owned() {
            Ok(permit) => Some(GateSlot { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Waits until a slot is free and reserves it.
    pub async fn enter(&self) -> Result<GateSlot, GateError> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GateError::Closed)?;
        Ok(GateSlot { _permit: permit })
    }

    /// Stops admitting work. Pending and future `enter` calls fail; held slots
    /// stay valid until dropped.
    pub fn close(&self) {
        self.slots.close();
    }
}
