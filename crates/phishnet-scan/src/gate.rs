//! Process-wide admission gate for reputation-service calls.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default number of concurrent reputation-service calls (free tier friendly)
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// Counting gate bounding in-flight calls across every request.
///
/// Permits are RAII guards: dropping a [`GatePermit`] returns the slot, so
/// success, error, timeout and cancellation all release it.
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max: usize,
}

/// One held slot of a [`ConcurrencyGate`]
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl ConcurrencyGate {
    /// Create a gate with `max` permits. A zero size is raised to one.
    #[must_use]
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> GatePermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            // the semaphore is owned here and never closed
            .unwrap_or_else(|_| unreachable!("concurrency gate semaphore closed"));
        GatePermit { _permit: permit }
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<GatePermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }

    /// Run `fut` while holding a slot
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        let _permit = self.acquire().await;
        fut.await
    }

    /// Configured number of slots
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Slots free right now
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots held right now
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.max - self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_acquire_blocks_when_full() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire().await;
        assert_eq!(gate.in_flight(), 1);

        let mut waiter = task::spawn(gate.acquire());
        assert_pending!(waiter.poll());

        drop(held);
        assert!(waiter.is_woken());
        let _permit = assert_ready!(waiter.poll());
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn test_permit_released_on_error_path() {
        let gate = ConcurrencyGate::new(2);
        let result: Result<(), &str> = gate.run(async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop_of_future() {
        let gate = ConcurrencyGate::new(1);
        {
            let mut pending = task::spawn(gate.run(std::future::pending::<()>()));
            assert_pending!(pending.poll());
            assert_eq!(gate.in_flight(), 1);
        }
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_try_acquire() {
        let gate = ConcurrencyGate::new(1);
        let first = gate.try_acquire();
        assert!(first.is_some());
        assert!(gate.try_acquire().is_none());
        drop(first);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_zero_size_raised_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.max(), 1);
        assert_eq!(ConcurrencyGate::default().max(), DEFAULT_MAX_CONCURRENCY);
    }
}
