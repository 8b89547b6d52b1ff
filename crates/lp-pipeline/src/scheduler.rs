//! Bounded, first-come first-served admission of external work.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lp_core::{Error, Result};
use tokio::sync::Semaphore;

/// Limits how many external tool invocations run at once.
///
/// Waiters are admitted in arrival order: tokio's semaphore is fair, so a
/// task that asked for a slot earlier is always served before a later one.
/// Cloning a scheduler shares its slots.
#[derive(Debug, Clone)]
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
}

impl Scheduler {
    /// Create a scheduler admitting up to `capacity` tasks. Zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait for a slot, run `task`, and release the slot when it finishes.
    ///
    /// The task's own result is returned unchanged; a failing task releases
    /// its slot like any other.
    pub async fn run<F, T>(&self, label: &str, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::Internal(format!("scheduler closed: {e}")))?;

        let _slot = InFlight::enter(&self.in_flight);
        tracing::debug!(
            task = label,
            in_flight = self.in_flight(),
            capacity = self.capacity,
            "admitted"
        );
        task.await
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(lp_core::config::DEFAULT_CONCURRENCY)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
