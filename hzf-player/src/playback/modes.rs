//! Autoplay / repeat activity
//!
//! Autoplay and standalone repeat are mutually exclusive. Rather than two
//! independent mode slots, the session holds one [`PlaybackActivity`] so both
//! can never be active at once.

use hzf_common::events::RunKind;
use hzf_common::{DisplayMode, PlaybackMode};
use serde::Serialize;

/// What the scheduler is currently asked to play
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PlaybackActivity {
    #[default]
    Idle,
    /// Walk the deck; `repeat` plays each word RepeatCount times
    Autoplaying { mode: PlaybackMode, repeat: bool },
    /// Repeat the current word RepeatCount times
    Repeating { mode: PlaybackMode },
}

impl PlaybackActivity {
    /// Autoplay in `mode` with the repeat toggle off (Idle when `mode` is off)
    pub fn autoplay(mode: PlaybackMode) -> Self {
        if mode.is_off() {
            PlaybackActivity::Idle
        } else {
            PlaybackActivity::Autoplaying { mode, repeat: false }
        }
    }

    /// Standalone repeat in `mode` (Idle when `mode` is off)
    pub fn repeat(mode: PlaybackMode) -> Self {
        if mode.is_off() {
            PlaybackActivity::Idle
        } else {
            PlaybackActivity::Repeating { mode }
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, PlaybackActivity::Idle)
    }

    pub fn autoplay_mode(self) -> PlaybackMode {
        match self {
            PlaybackActivity::Autoplaying { mode, .. } => mode,
            _ => PlaybackMode::Off,
        }
    }

    pub fn repeat_mode(self) -> PlaybackMode {
        match self {
            PlaybackActivity::Repeating { mode } => mode,
            _ => PlaybackMode::Off,
        }
    }

    /// Whether autoplay repeats each word (false outside autoplay)
    pub fn autoplay_repeat(self) -> bool {
        matches!(self, PlaybackActivity::Autoplaying { repeat: true, .. })
    }

    /// Mode of whichever loop is active
    pub fn mode(self) -> PlaybackMode {
        match self {
            PlaybackActivity::Idle => PlaybackMode::Off,
            PlaybackActivity::Autoplaying { mode, .. } | PlaybackActivity::Repeating { mode } => mode,
        }
    }

    pub fn run_kind(self) -> Option<RunKind> {
        match self {
            PlaybackActivity::Idle => None,
            PlaybackActivity::Autoplaying { .. } => Some(RunKind::Autoplay),
            PlaybackActivity::Repeating { .. } => Some(RunKind::Repeat),
        }
    }

    /// Card side implied by the active mode (`Both` when idle)
    pub fn display_mode(self) -> DisplayMode {
        self.mode().display_mode()
    }
}

impl std::fmt::Display for PlaybackActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackActivity::Idle => write!(f, "idle"),
            PlaybackActivity::Autoplaying { mode, repeat: false } => write!(f, "autoplay {}", mode),
            PlaybackActivity::Autoplaying { mode, repeat: true } => {
                write!(f, "autoplay {} (repeat)", mode)
            }
            PlaybackActivity::Repeating { mode } => write!(f, "repeat {}", mode),
        }
    }
}

/// Cycles per word when repeating; zero means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepeatCount(u32);

impl RepeatCount {
    pub const UNBOUNDED: RepeatCount = RepeatCount(0);

    pub fn new(count: u32) -> Self {
        RepeatCount(count)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_unbounded(self) -> bool {
        self.0 == 0
    }

    /// Exact cycle limit, or None when unbounded
    pub fn limit(self) -> Option<u32> {
        if self.is_unbounded() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount(1)
    }
}

impl std::fmt::Display for RepeatCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unbounded() {
            write!(f, "∞")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// True while `cycles` is below `limit` (always true when unbounded)
pub(crate) fn cycles_remaining(limit: Option<u32>, cycles: u32) -> bool {
    limit.map_or(true, |n| cycles < n)
}
