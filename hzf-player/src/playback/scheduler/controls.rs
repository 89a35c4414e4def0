//! Mode setters, navigation and timing controls
//!
//! Every operation that changes what should be playing cancels the current
//! run first, under the same state lock as its own writes, and then bumps the
//! restart key so the supervisor starts the replacement loop.

use super::core::PlaybackScheduler;
use crate::playback::{PlaybackActivity, RepeatCount};
use crate::state::sanitize_seconds;
use hzf_common::{DisplayMode, PlaybackMode};
use tracing::info;

impl PlaybackScheduler {
    /// Switch autoplay to `mode` (Off stops it)
    ///
    /// Forces standalone repeat off and resets the autoplay-repeat toggle.
    pub fn set_autoplay_mode(&self, mode: PlaybackMode) {
        let activity = PlaybackActivity::autoplay(mode);
        self.apply_activity(activity);
        info!("Autoplay mode set to {}", mode);
    }

    /// Switch standalone repeat to `mode` (Off stops it)
    ///
    /// Forces autoplay off.
    pub fn set_repeat_mode(&self, mode: PlaybackMode) {
        let activity = PlaybackActivity::repeat(mode);
        self.apply_activity(activity);
        info!("Repeat mode set to {}", mode);
    }

    fn apply_activity(&self, activity: PlaybackActivity) {
        {
            let mut w = self.inner.state.write();
            self.inner.cancel_with(&mut w);
            w.set_activity(activity);
            w.set_display(activity.display_mode());
        }
        self.inner.request_restart();
    }

    /// Flip the autoplay-repeat toggle
    ///
    /// No-op (returns false) unless autoplay is active. Turning the toggle on,
    /// or off with a bounded count, restarts the run on the current word so
    /// the new setting applies at once. Turning it off while a running loop
    /// holds a word indefinitely lets the cycle in flight finish and then
    /// moves on.
    pub fn toggle_autoplay_repeat(&self) -> bool {
        let hold_released = {
            let mut w = self.inner.state.write();
            let PlaybackActivity::Autoplaying { mode, repeat } = w.activity() else {
                return false;
            };

            let unbounded = self.inner.state.timing().repeat_count.is_unbounded();
            // Only a loop that is still running can pick up the release
            let soft = repeat && unbounded && self.inner.runs.has_live_run();
            if !soft {
                self.inner.cancel_with(&mut w);
            }
            w.set_activity(PlaybackActivity::Autoplaying {
                mode,
                repeat: !repeat,
            });
            info!("Autoplay repeat {}", if repeat { "off" } else { "on" });
            soft
        };

        if !hold_released {
            self.inner.request_restart();
        }
        true
    }

    /// Advance one card, wrapping to the first
    pub fn go_to_next(&self) {
        self.step(|index, total| (index + 1) % total);
    }

    /// Go back one card, wrapping to the last
    pub fn go_to_previous(&self) {
        self.step(|index, total| (index + total - 1) % total);
    }

    fn step(&self, next: impl FnOnce(usize, usize) -> usize) {
        let total = self.inner.total_words();
        if total == 0 {
            return;
        }

        let active = {
            let mut w = self.inner.state.write();
            self.inner.cancel_with(&mut w);
            let index = next(w.current_index().min(total - 1), total);
            w.set_index(index);
            w.set_display(DisplayMode::Both);
            w.activity().is_active()
        };

        if active {
            self.inner.request_restart();
        }
    }

    /// Seek to `index`, clamped to the deck
    ///
    /// The display follows the active mode, or shows both sides when idle.
    pub fn go_to_index(&self, index: usize) {
        let total = self.inner.total_words();
        if total == 0 {
            return;
        }
        let target = index.min(total - 1);

        let active = {
            let mut w = self.inner.state.write();
            self.inner.cancel_with(&mut w);
            w.set_index(target);
            let activity = w.activity();
            w.set_display(activity.display_mode());
            activity.is_active()
        };

        if active {
            self.inner.request_restart();
        }
    }

    /// Stop autoplay and repeat and show both sides
    pub fn stop_all(&self) {
        let mut w = self.inner.state.write();
        self.inner.cancel_with(&mut w);
        w.set_activity(PlaybackActivity::Idle);
        w.set_display(DisplayMode::Both);
    }

    /// Cycles per word when repeating; 0 means unbounded
    pub fn set_repeat_count(&self, count: u32) {
        self.inner
            .state
            .update_timing(|t| t.repeat_count = RepeatCount::new(count));
        info!("Repeat count set to {}", RepeatCount::new(count));
    }

    /// Seconds between the two languages of a cycle
    pub fn set_language_gap(&self, seconds: f64) {
        let seconds = sanitize_seconds(seconds);
        self.inner.state.update_timing(|t| t.language_gap = seconds);
    }

    /// Seconds between words and between repeat cycles
    pub fn set_next_delay(&self, seconds: f64) {
        let seconds = sanitize_seconds(seconds);
        self.inner.state.update_timing(|t| t.next_delay = seconds);
    }

    /// Percentage of the deck reached
    pub fn completion_percentage(&self) -> f64 {
        self.inner.state.completion_percentage()
    }
}
