//! # HanziFlip Player Library (hzf-player)
//!
//! Flashcard playback for Chinese/English vocabulary study.
//!
//! **Purpose:** Speak words in one or both languages, walk the deck
//! automatically (autoplay) or drill the current word (repeat), and keep the
//! session state coherent when the learner navigates mid-playback.
//!
//! **Architecture:** One cancelable loop per run. Every mode change or
//! navigation invalidates the current run; stale loops stop at their next
//! suspension point and never write session state.

pub mod console;
pub mod error;
pub mod playback;
pub mod speech;
pub mod state;

pub use error::{Error, Result};
pub use playback::PlaybackScheduler;
pub use state::{SessionState, TimingSettings};
