//! Core scheduler - lifecycle, run supervision and cancellation
//!
//! **Responsibilities:**
//! - PlaybackScheduler struct definition and initialization
//! - Restart supervision: one task observes the restart key and (re)starts loops
//! - `cancel()`: invalidate the run, resolve the pending wait, stop speech
//! - Guarded writes: a run may only mutate session state while it is current

use crate::playback::run::{PlaybackRun, RunId, RunRegistry};
use crate::playback::source::WordSource;
use crate::playback::wait::{seconds_to_duration, CancelableWait};
use crate::playback::PlaybackActivity;
use crate::speech::{self, SpeechError, SpeechService};
use crate::state::{SessionState, StateWriter, TimingSettings};
use hzf_common::events::{RunEndReason, StudyEvent};
use hzf_common::Language;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Drives autoplay and repeat playback for one study session
///
/// Must be created inside a Tokio runtime: construction spawns the task that
/// owns loop (re)starts.
pub struct PlaybackScheduler {
    pub(super) inner: Arc<SchedulerInner>,
}

pub(super) struct SchedulerInner {
    /// Session state shared with the UI layer
    pub(super) state: Arc<SessionState>,

    /// Word lookup by index
    pub(super) words: Arc<dyn WordSource>,

    /// Text-to-speech
    pub(super) speech: Arc<dyn SpeechService>,

    /// Live run identity
    pub(super) runs: RunRegistry,

    /// The single pending-wait slot
    pub(super) waiter: CancelableWait,

    /// Restart key; every bump tears down and re-establishes the loop
    pub(super) restart_tx: watch::Sender<u64>,

    /// Restart supervisor task
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackScheduler {
    /// Create a scheduler over `words` with fresh session state
    pub fn new(
        words: Arc<dyn WordSource>,
        speech: Arc<dyn SpeechService>,
        timing: TimingSettings,
    ) -> Self {
        let state = Arc::new(SessionState::new(words.len(), timing));
        Self::with_state(state, words, speech)
    }

    /// Create a scheduler driving existing session state
    pub fn with_state(
        state: Arc<SessionState>,
        words: Arc<dyn WordSource>,
        speech: Arc<dyn SpeechService>,
    ) -> Self {
        let (restart_tx, restart_rx) = watch::channel(0u64);

        let inner = Arc::new(SchedulerInner {
            state,
            words,
            speech,
            runs: RunRegistry::new(),
            waiter: CancelableWait::new(),
            restart_tx,
            supervisor: Mutex::new(None),
        });

        let handle = tokio::spawn(supervise(Arc::downgrade(&inner), restart_rx));
        *inner.supervisor_slot() = Some(handle);

        info!(
            "Playback scheduler created ({} words)",
            inner.state.total_words()
        );

        Self { inner }
    }

    /// Session state observed by the UI layer
    pub fn state(&self) -> &Arc<SessionState> {
        &self.inner.state
    }

    /// Stop whatever is playing right now
    ///
    /// Returns synchronously. The superseded loop notices at its next
    /// suspension point and exits on its own without writing state.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Identity of the current run (or of the last invalidation)
    pub fn current_run(&self) -> RunId {
        self.inner.runs.current_id()
    }

    /// Number of restart requests issued so far
    pub fn restart_key(&self) -> u64 {
        *self.inner.restart_tx.borrow()
    }

    /// Stop playback and the supervisor task
    pub fn shutdown(&self) {
        self.stop_all();
        if let Some(handle) = self.inner.supervisor_slot().take() {
            handle.abort();
        }
        info!("Playback scheduler stopped");
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        // Running loops hold the inner Arc, so they must be told to stop
        self.inner.cancel();
        if let Some(handle) = self.inner.supervisor_slot().take() {
            handle.abort();
        }
    }
}

/// Observe the restart key and (re)start the loop for each new value
async fn supervise(inner: Weak<SchedulerInner>, mut restart_rx: watch::Receiver<u64>) {
    debug!("Restart supervisor started");
    while restart_rx.changed().await.is_ok() {
        let key = *restart_rx.borrow_and_update();
        let Some(inner) = inner.upgrade() else {
            break;
        };
        debug!("Restart key {} observed", key);
        inner.start_run();
    }
    debug!("Restart supervisor stopped");
}

impl SchedulerInner {
    fn supervisor_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.supervisor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn total_words(&self) -> usize {
        self.state.total_words()
    }

    /// Bump the restart key
    pub(super) fn request_restart(&self) {
        self.restart_tx.send_modify(|key| *key = key.wrapping_add(1));
    }

    pub(super) fn cancel(&self) {
        let mut writer = self.state.write();
        self.cancel_with(&mut writer);
    }

    /// Cancel while the caller already holds the state writer
    ///
    /// Invalidation happens under the state lock, so no stale run can slip a
    /// write in between the cancel and the caller's own mutations.
    pub(super) fn cancel_with(&self, writer: &mut StateWriter<'_>) {
        let stale = self.runs.invalidate();
        writer.set_spoken(None);
        self.waiter.cancel_pending();
        self.speech.stop();
        debug!("Playback cancelled, current run is now {}", stale);
    }

    /// Apply `update` only if `run` is still current
    pub(super) fn publish(
        &self,
        run: &PlaybackRun,
        update: impl FnOnce(&mut StateWriter<'_>),
    ) -> bool {
        let mut writer = self.state.write();
        if !self.runs.is_current(run) {
            return false;
        }
        update(&mut writer);
        true
    }

    /// Wait `seconds` on the shared wait slot; true if `run` is still current after
    pub(super) async fn pause(&self, run: &PlaybackRun, seconds: f64) -> bool {
        if !self.runs.is_current(run) {
            return false;
        }
        let duration = seconds_to_duration(seconds);
        tokio::select! {
            biased;
            _ = run.cancelled() => {}
            _ = self.waiter.wait(duration) => {}
        }
        self.runs.is_current(run)
    }

    /// Speak `text`; Ok(false) when the run was cancelled first
    pub(super) async fn speak(
        &self,
        run: &PlaybackRun,
        language: Language,
        text: &str,
    ) -> Result<bool, SpeechError> {
        tokio::select! {
            biased;
            _ = run.cancelled() => Ok(false),
            result = speech::speak(self.speech.as_ref(), language, text) => {
                result.map(|()| self.runs.is_current(run))
            }
        }
    }

    /// Start a loop for the active mode, superseding any previous run
    fn start_run(self: &Arc<Self>) {
        let total = self.total_words();

        let started = {
            let writer = self.state.write();
            let activity = writer.activity();
            match activity.run_kind() {
                Some(kind) if total > 0 => {
                    let start_index = writer.current_index().min(total - 1);
                    Some((self.runs.begin(), activity, kind, start_index))
                }
                _ => None,
            }
        };

        let Some((run, activity, kind, start_index)) = started else {
            debug!("No playback active, nothing to start");
            return;
        };

        info!(
            "Starting {} {} at index {} ({})",
            kind,
            run.id(),
            start_index,
            activity
        );
        self.state.events().emit_lossy(StudyEvent::RunStarted {
            run_id: run.id().value(),
            kind,
            start_index,
            timestamp: chrono::Utc::now(),
        });

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let reason = match activity {
                PlaybackActivity::Autoplaying { mode, .. } => {
                    inner.run_autoplay(&run, mode, start_index).await
                }
                PlaybackActivity::Repeating { mode } => {
                    inner.run_repeat(&run, mode, start_index).await
                }
                PlaybackActivity::Idle => RunEndReason::Cancelled,
            };
            inner.finish_run(&run, reason);
        });
    }

    /// Clear the spoken indicator and report the end of a run
    fn finish_run(&self, run: &PlaybackRun, reason: RunEndReason) {
        self.runs.finish(run);

        // A superseded run leaves the indicator to whoever replaced it
        self.publish(run, |w| w.set_spoken(None));

        info!("{} ended: {}", run.id(), reason);
        self.state.events().emit_lossy(StudyEvent::RunEnded {
            run_id: run.id().value(),
            reason,
            timestamp: chrono::Utc::now(),
        });
    }
}
