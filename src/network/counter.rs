//! In-flight request counter with debounced release

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::{Result, StubtapeError};

/// Counts requests that have been observed but not yet answered
///
/// Releasing the last outstanding request is deferred by the debounce delay so
/// that a follow-up request fired shortly after a response keeps the counter
/// above zero. Clones share the same count.
#[derive(Debug, Clone)]
pub struct InFlightCounter {
    count: Arc<AtomicUsize>,
    debounce: Duration,
}

impl InFlightCounter {
    /// Create a counter at zero
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            debounce,
        }
    }

    /// A request was observed
    pub fn increment(&self) {
        let now = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("In-flight +1 -> {}", now);
    }

    /// A response was observed
    ///
    /// With more than one request outstanding the count drops immediately.
    /// For the last one the drop happens on a spawned task after the debounce
    /// delay; outside a tokio runtime, or with a zero delay, it drops at once.
    pub fn decrement(&self) {
        let current = self.count.load(Ordering::SeqCst);

        if current == 0 {
            warn!("In-flight counter decremented at zero, ignoring");
            return;
        }

        if current > 1 || self.debounce.is_zero() {
            release(&self.count);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let count = Arc::clone(&self.count);
                let delay = self.debounce;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    release(&count);
                });
            }
            Err(_) => {
                warn!("No tokio runtime for debounced release, releasing immediately");
                release(&self.count);
            }
        }
    }

    /// Current number of outstanding requests
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Whether no request is outstanding
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.count() == 0
    }

    /// Configured debounce delay
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Poll until the counter reaches zero
    ///
    /// A request that never completes keeps the counter above zero; the
    /// timeout is the only way out of that.
    ///
    /// # Errors
    ///
    /// Returns [`StubtapeError::IdleTimeout`] if the counter is still non-zero after `timeout`
    pub async fn wait_until_idle(&self, poll_interval: Duration, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        let poll = async {
            while !self.is_idle() {
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| StubtapeError::IdleTimeout {
                pending: self.count(),
                waited: started.elapsed(),
            })
    }
}

fn release(count: &AtomicUsize) {
    match count.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
        Ok(prev) => trace!("In-flight -1 -> {}", prev - 1),
        Err(_) => warn!("In-flight counter already at zero"),
    }
}
