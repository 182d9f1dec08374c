// Concurrency controller for handlehunt
// Bounds in-flight probes with a semaphore and carries the per-request deadline

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ScanError;

#[derive(Debug)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Admission control shared by every probe in a batch.
#[derive(Debug, Clone)]
pub struct ConcurrencyController {
    semaphore: Arc<Semaphore>,
    counters: Arc<Counters>,
    limit: usize,
    timeout: Duration,
}

/// A held admission slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyController {
    /// A zero limit would never admit anything, so it is refused.
    pub fn new(limit: usize, timeout: Duration) -> Result<Self, ScanError> {
        if limit == 0 {
            return Err(ScanError::BatchFailure(
                "concurrency limit must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            counters: Arc::new(Counters {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
            limit,
            timeout,
        })
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<Slot, ScanError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ScanError::BatchFailure(e.to_string()))?;
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Slot {
            _permit: permit,
            counters: self.counters.clone(),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots held at once since creation.
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}
