//! Cancelable timed wait
//!
//! At most one wait is pending at any time: starting a new wait resolves the
//! previous one first, and [`CancelableWait::cancel_pending`] resolves the
//! pending wait immediately instead of letting its timer expire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a wait finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Full duration passed
    Elapsed,
    /// Resolved early by cancellation or a newer wait
    Cancelled,
}

#[derive(Debug)]
struct PendingWait {
    seq: u64,
    token: CancellationToken,
}

/// Single-slot cancelable timer
#[derive(Debug, Default)]
pub struct CancelableWait {
    pending: Mutex<Option<PendingWait>>,
    next_seq: AtomicU64,
}

/// Clears the slot when the owning wait finishes or is dropped mid-flight
struct SlotGuard<'a> {
    wait: &'a CancelableWait,
    seq: u64,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.wait.slot();
        if slot.as_ref().is_some_and(|p| p.seq == self.seq) {
            *slot = None;
        }
    }
}

impl CancelableWait {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<PendingWait>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for `duration`, or less if cancelled
    pub async fn wait(&self, duration: Duration) -> WaitOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.slot().replace(PendingWait {
            seq,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
        let _guard = SlotGuard { wait: self, seq };

        tokio::select! {
            _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
            _ = token.cancelled() => WaitOutcome::Cancelled,
        }
    }

    /// Resolve the pending wait early; returns false if none was pending
    pub fn cancel_pending(&self) -> bool {
        match self.slot().take() {
            Some(pending) => {
                pending.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.slot().is_some()
    }
}

/// Convert a configured delay in seconds to a Duration
///
/// Negative, NaN and out-of-range values become zero.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}
