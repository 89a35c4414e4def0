//! Event types for the HanziFlip event system
//!
//! Provides shared event definitions and the EventBus used by the study session.

mod playback_types;

pub use playback_types::{DisplayMode, Language, PlaybackMode, RunEndReason, RunKind};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Study session event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag so a
/// front end can consume them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StudyEvent {
    /// Current card index changed (navigation, seek or autoplay advance)
    ///
    /// Triggers:
    /// - UI: Show the card at `index`
    /// - UI: Update the progress bar
    IndexChanged {
        /// New 0-based card index
        index: usize,
        /// Number of words in the deck
        total_words: usize,
        /// When the index changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visible card side changed
    DisplayModeChanged {
        /// Side(s) of the card to show
        display_mode: DisplayMode,
        /// When the display changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Autoplay / repeat activity changed
    ///
    /// At most one of `autoplay_mode` and `repeat_mode` is ever non-off.
    ActivityChanged {
        /// Autoplay mode (Off when not autoplaying)
        autoplay_mode: PlaybackMode,
        /// Standalone repeat mode (Off when not repeating)
        repeat_mode: PlaybackMode,
        /// Whether autoplay repeats each word RepeatCount times
        autoplay_repeat: bool,
        /// When the activity changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Speech for one side of a word began
    SpeechStarted {
        /// Language being spoken
        language: Language,
        /// Text handed to the speech service
        text: String,
        /// When speech started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Speech for one side of a word completed
    SpeechFinished {
        /// Language that finished
        language: Language,
        /// When speech finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Speech service reported an error
    ///
    /// NOTE: Soft failure. The run winds down, the session stays usable.
    SpeechFailed {
        /// Language that failed
        language: Language,
        /// Error message from the speech service
        message: String,
        /// When the failure was observed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A playback run started
    RunStarted {
        /// Run identity
        run_id: u64,
        /// Autoplay or repeat loop
        kind: RunKind,
        /// Index the run started from
        start_index: usize,
        /// When the run started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A playback run ended
    RunEnded {
        /// Run identity
        run_id: u64,
        /// Why the run stopped
        reason: RunEndReason,
        /// When the run ended
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl StudyEvent {
    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            StudyEvent::IndexChanged { .. } => "IndexChanged",
            StudyEvent::DisplayModeChanged { .. } => "DisplayModeChanged",
            StudyEvent::ActivityChanged { .. } => "ActivityChanged",
            StudyEvent::SpeechStarted { .. } => "SpeechStarted",
            StudyEvent::SpeechFinished { .. } => "SpeechFinished",
            StudyEvent::SpeechFailed { .. } => "SpeechFailed",
            StudyEvent::RunStarted { .. } => "RunStarted",
            StudyEvent::RunEnded { .. } => "RunEnded",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for study session events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the playback loop)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use hzf_common::events::{EventBus, StudyEvent, DisplayMode};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(StudyEvent::DisplayModeChanged {
///     display_mode: DisplayMode::Both,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert!(matches!(rx.try_recv(), Ok(StudyEvent::DisplayModeChanged { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StudyEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<StudyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: StudyEvent,
    ) -> Result<usize, broadcast::error::SendError<StudyEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: StudyEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
