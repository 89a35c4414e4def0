//! Shared study session state
//!
//! Thread-safe state observed by the UI layer and mutated by the playback
//! scheduler. Short synchronous critical sections only: no lock is ever held
//! across an await.
//!
//! Timing parameters live in a `watch` cell so running loops always read the
//! latest values at the moment a wait begins.

use crate::playback::{PlaybackActivity, RepeatCount};
use hzf_common::config::StudySettings;
use hzf_common::events::{EventBus, StudyEvent};
use hzf_common::human_time::format_clock;
use hzf_common::{DisplayMode, Language, PlaybackMode};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::time::Instant;

/// Default event channel capacity for a single learner
const EVENT_CAPACITY: usize = 256;

/// Timing parameters read live by running loops
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingSettings {
    /// Seconds between the two languages of one cycle
    pub language_gap: f64,
    /// Seconds between words, or between repeat cycles
    pub next_delay: f64,
    /// Cycles per word when repeating
    pub repeat_count: RepeatCount,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self::from(&StudySettings::default())
    }
}

impl From<&StudySettings> for TimingSettings {
    fn from(settings: &StudySettings) -> Self {
        Self {
            language_gap: sanitize_seconds(settings.language_gap),
            next_delay: sanitize_seconds(settings.next_delay),
            repeat_count: RepeatCount::new(settings.repeat_count),
        }
    }
}

/// Clamp a delay to a finite, non-negative number of seconds
pub fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug)]
pub(crate) struct SessionInner {
    current_index: usize,
    activity: PlaybackActivity,
    display_mode: DisplayMode,
    currently_spoken: Option<Language>,
}

/// Point-in-time view of the session for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub current_index: usize,
    pub total_words: usize,
    pub completion_percentage: f64,
    pub activity: PlaybackActivity,
    pub autoplay_mode: PlaybackMode,
    pub repeat_mode: PlaybackMode,
    pub autoplay_repeat: bool,
    pub display_mode: DisplayMode,
    pub currently_spoken: Option<Language>,
    pub timing: TimingSettings,
    pub elapsed: String,
}

/// Shared state accessible by the scheduler and its callers
pub struct SessionState {
    inner: Mutex<SessionInner>,
    total_words: usize,
    timing: watch::Sender<TimingSettings>,
    events: EventBus,
    started_at: Instant,
}

impl SessionState {
    /// Create session state for a deck of `total_words`
    pub fn new(total_words: usize, timing: TimingSettings) -> Self {
        Self::with_event_bus(total_words, timing, EventBus::new(EVENT_CAPACITY))
    }

    pub fn with_event_bus(total_words: usize, timing: TimingSettings, events: EventBus) -> Self {
        let (timing_tx, _) = watch::channel(timing);
        Self {
            inner: Mutex::new(SessionInner {
                current_index: 0,
                activity: PlaybackActivity::Idle,
                display_mode: DisplayMode::Both,
                currently_spoken: None,
            }),
            total_words,
            timing: timing_tx,
            events,
            started_at: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive writer; events for changed fields are emitted when it drops
    pub(crate) fn write(&self) -> StateWriter<'_> {
        StateWriter {
            inner: self.lock(),
            events: &self.events,
            total_words: self.total_words,
            pending: Vec::new(),
        }
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    pub fn current_index(&self) -> usize {
        self.lock().current_index
    }

    pub fn activity(&self) -> PlaybackActivity {
        self.lock().activity
    }

    pub fn autoplay_mode(&self) -> PlaybackMode {
        self.activity().autoplay_mode()
    }

    pub fn repeat_mode(&self) -> PlaybackMode {
        self.activity().repeat_mode()
    }

    pub fn is_autoplay_active(&self) -> bool {
        matches!(self.activity(), PlaybackActivity::Autoplaying { .. })
    }

    pub fn is_repeat_active(&self) -> bool {
        matches!(self.activity(), PlaybackActivity::Repeating { .. })
    }

    pub fn is_autoplay_repeating(&self) -> bool {
        self.activity().autoplay_repeat()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.lock().display_mode
    }

    pub fn currently_spoken(&self) -> Option<Language> {
        self.lock().currently_spoken
    }

    /// Latest timing parameters
    pub fn timing(&self) -> TimingSettings {
        *self.timing.borrow()
    }

    /// Watch timing changes
    pub fn subscribe_timing(&self) -> watch::Receiver<TimingSettings> {
        self.timing.subscribe()
    }

    pub(crate) fn update_timing(&self, update: impl FnOnce(&mut TimingSettings)) {
        self.timing.send_modify(update);
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<StudyEvent> {
        self.events.subscribe()
    }

    /// Percentage of the deck reached: `(index + 1) / total * 100`, 0 when empty
    pub fn completion_percentage(&self) -> f64 {
        if self.total_words == 0 {
            return 0.0;
        }
        (self.current_index() + 1) as f64 / self.total_words as f64 * 100.0
    }

    /// Whole seconds since the session started
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Elapsed session time as `MM:SS`
    pub fn formatted_time(&self) -> String {
        format_clock(self.elapsed_secs())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (current_index, activity, display_mode, currently_spoken) = {
            let inner = self.lock();
            (
                inner.current_index,
                inner.activity,
                inner.display_mode,
                inner.currently_spoken,
            )
        };

        SessionSnapshot {
            current_index,
            total_words: self.total_words,
            completion_percentage: self.completion_percentage(),
            activity,
            autoplay_mode: activity.autoplay_mode(),
            repeat_mode: activity.repeat_mode(),
            autoplay_repeat: activity.autoplay_repeat(),
            display_mode,
            currently_spoken,
            timing: self.timing(),
            elapsed: self.formatted_time(),
        }
    }
}

/// Locked view of the session used for every mutation
///
/// Holding the writer is what makes run-validity checks and the writes they
/// guard atomic with respect to cancellation.
pub(crate) struct StateWriter<'a> {
    inner: MutexGuard<'a, SessionInner>,
    events: &'a EventBus,
    total_words: usize,
    pending: Vec<StudyEvent>,
}

impl StateWriter<'_> {
    pub fn current_index(&self) -> usize {
        self.inner.current_index
    }

    pub fn activity(&self) -> PlaybackActivity {
        self.inner.activity
    }

    pub fn set_index(&mut self, index: usize) {
        if self.inner.current_index != index {
            self.inner.current_index = index;
            self.pending.push(StudyEvent::IndexChanged {
                index,
                total_words: self.total_words,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub fn set_display(&mut self, display_mode: DisplayMode) {
        if self.inner.display_mode != display_mode {
            self.inner.display_mode = display_mode;
            self.pending.push(StudyEvent::DisplayModeChanged {
                display_mode,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub fn set_spoken(&mut self, spoken: Option<Language>) {
        self.inner.currently_spoken = spoken;
    }

    pub fn set_activity(&mut self, activity: PlaybackActivity) {
        if self.inner.activity != activity {
            self.inner.activity = activity;
            self.pending.push(StudyEvent::ActivityChanged {
                autoplay_mode: activity.autoplay_mode(),
                repeat_mode: activity.repeat_mode(),
                autoplay_repeat: activity.autoplay_repeat(),
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Drop for StateWriter<'_> {
    fn drop(&mut self) {
        // Broadcast never blocks, so emitting under the lock keeps event order
        // identical to mutation order.
        for event in self.pending.drain(..) {
            self.events.emit_lossy(event);
        }
    }
}
