//! Playback run identity and cancellation
//!
//! Every autoplay or repeat loop executes as a *run*. Exactly one run id is
//! current at a time; a loop holding any other id is stale and must stop at
//! its next check without touching shared state.
//!
//! Each run also carries a [`CancellationToken`] so that suspended speech and
//! waits resolve the moment the run is invalidated, instead of lingering until
//! they finish on their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Opaque, monotonically increasing run identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Handle held by one loop for the lifetime of its run
#[derive(Debug, Clone)]
pub struct PlaybackRun {
    id: RunId,
    token: CancellationToken,
}

impl PlaybackRun {
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Resolves once this run has been invalidated
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Owner of the live run identity
#[derive(Debug)]
pub struct RunRegistry {
    current: AtomicU64,
    /// Id of the run whose loop is still executing (0 = none)
    live: AtomicU64,
    token: Mutex<CancellationToken>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
            live: AtomicU64::new(0),
            token: Mutex::new(CancellationToken::new()),
        }
    }

    /// Start a fresh run, invalidating whichever run was current
    pub fn begin(&self) -> PlaybackRun {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = {
            let mut slot = self.token.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, token.clone())
        };
        previous.cancel();
        self.live.store(id, Ordering::SeqCst);

        PlaybackRun {
            id: RunId(id),
            token,
        }
    }

    /// Invalidate the current run without starting another
    ///
    /// Returns the id that is now current (owned by no loop).
    pub fn invalidate(&self) -> RunId {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        RunId(id)
    }

    pub fn is_current(&self, run: &PlaybackRun) -> bool {
        self.current.load(Ordering::SeqCst) == run.id.0
    }

    pub fn current_id(&self) -> RunId {
        RunId(self.current.load(Ordering::SeqCst))
    }

    /// Record that the loop owning `run` has exited
    pub fn finish(&self, run: &PlaybackRun) {
        let _ = self
            .live
            .compare_exchange(run.id.0, 0, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// True while the current run's loop is still executing
    pub fn has_live_run(&self) -> bool {
        let live = self.live.load(Ordering::SeqCst);
        live != 0 && live == self.current.load(Ordering::SeqCst)
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}
