use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Cloneable stop signal that wakes any waiter immediately.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks for up to `timeout`. Returns true if cancelled.
    ///
    /// A timeout too large to represent as an `Instant` waits for cancellation
    /// only.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);

        while !*cancelled {
            cancelled = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    cvar.wait_timeout(cancelled, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => cvar.wait(cancelled).unwrap_or_else(PoisonError::into_inner),
            };
        }

        *cancelled
    }
}

/// Runs a task, waits `interval` after it completes, and repeats until
/// cancelled.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicRunner {
    interval: Duration,
}

impl PeriodicRunner {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of times `task` ran.
    pub fn run<F: FnMut()>(&self, token: &CancellationToken, mut task: F) -> u64 {
        let mut cycles = 0;
        while !token.is_cancelled() {
            task();
            cycles += 1;
            if token.wait_timeout(self.interval) {
                break;
            }
        }
        cycles
    }
}
