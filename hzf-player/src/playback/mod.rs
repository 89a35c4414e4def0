//! Playback scheduling for study sessions
//!
//! Autoplay walks the deck, repeat drills a single word. Both run as
//! cancelable loops owned by [`PlaybackScheduler`].

pub mod modes;
pub mod run;
pub mod scheduler;
pub mod source;
pub mod wait;

pub use modes::{PlaybackActivity, RepeatCount};
pub use run::{PlaybackRun, RunId, RunRegistry};
pub use scheduler::{CycleOutcome, PlaybackScheduler};
pub use source::WordSource;
pub use wait::{CancelableWait, WaitOutcome};
