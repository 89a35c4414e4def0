//! Autoplay and repeat loops
//!
//! Both loops run as a single task per run and stop at the first suspension
//! point after their run goes stale. Timing is read from the live settings at
//! the moment each wait begins.

use super::core::SchedulerInner;
use super::cycle::CycleOutcome;
use crate::playback::modes::cycles_remaining;
use crate::playback::run::PlaybackRun;
use crate::playback::PlaybackActivity;
use hzf_common::events::RunEndReason;
use hzf_common::{DisplayMode, PlaybackMode};
use tracing::{debug, info, warn};

impl From<CycleOutcome> for RunEndReason {
    fn from(outcome: CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::Failed(_) => RunEndReason::SpeechFailed,
            CycleOutcome::Completed | CycleOutcome::Cancelled => RunEndReason::Cancelled,
        }
    }
}

impl SchedulerInner {
    /// Cycles to play on the current word during autoplay
    ///
    /// `word_limit` is the repeat count captured when the word started. The
    /// toggle itself is read live so releasing it stops after the cycle in
    /// flight.
    fn autoplay_cycle_limit(&self, word_limit: Option<u32>) -> Option<u32> {
        if self.state.is_autoplay_repeating() {
            word_limit
        } else {
            Some(1)
        }
    }

    /// Autoplay on the current word forever (repeat toggle on, count unbounded)
    fn autoplay_holds_word(&self) -> bool {
        self.state.is_autoplay_repeating() && self.state.timing().repeat_count.is_unbounded()
    }

    /// Walk the deck from `start_index`, wrapping at the end
    ///
    /// The index is tracked locally: external index changes only take effect
    /// through a restart.
    pub(super) async fn run_autoplay(
        &self,
        run: &PlaybackRun,
        mode: PlaybackMode,
        start_index: usize,
    ) -> RunEndReason {
        let total = self.total_words();
        let leading = mode.display_mode();
        let mut index = start_index;

        loop {
            let Some(word) = self.words.word_at(index) else {
                warn!("No word at index {}, stopping autoplay", index);
                return RunEndReason::WordMissing;
            };
            debug!("{} playing word {} '{}'", run.id(), index, word.chinese);

            // Count changes apply from the next word
            let word_limit = self.state.timing().repeat_count.limit();
            let mut cycles = 0u32;
            while cycles_remaining(self.autoplay_cycle_limit(word_limit), cycles) {
                let outcome = self.play_one_cycle(mode, &word, run).await;
                if !outcome.is_success() {
                    return outcome.into();
                }
                cycles = cycles.saturating_add(1);

                if cycles_remaining(self.autoplay_cycle_limit(word_limit), cycles) {
                    let gap = self.state.timing().language_gap;
                    if !self.pause(run, gap).await {
                        return RunEndReason::Cancelled;
                    }
                }
            }

            let delay = self.state.timing().next_delay;
            if !self.pause(run, delay).await {
                return RunEndReason::Cancelled;
            }

            let hold = self.autoplay_holds_word();
            if !hold {
                index = (index + 1) % total;
            }
            let advanced = self.publish(run, |w| {
                if !hold {
                    w.set_index(index);
                }
                w.set_display(leading);
            });
            if !advanced {
                return RunEndReason::Cancelled;
            }

            // Zero delays with instant speech must still let other tasks run
            tokio::task::yield_now().await;
        }
    }

    /// Repeat the word at `index` RepeatCount times, then switch repeat off
    ///
    /// The count is captured when the run starts. An unbounded count only ends
    /// through cancellation.
    pub(super) async fn run_repeat(
        &self,
        run: &PlaybackRun,
        mode: PlaybackMode,
        index: usize,
    ) -> RunEndReason {
        let Some(word) = self.words.word_at(index) else {
            warn!("No word at index {}, stopping repeat", index);
            return RunEndReason::WordMissing;
        };

        let count = self.state.timing().repeat_count;
        let limit = count.limit();
        let leading = mode.display_mode();
        debug!("{} repeating word {} x{}", run.id(), index, count);

        let mut cycles = 0u32;
        while cycles_remaining(limit, cycles) {
            let outcome = self.play_one_cycle(mode, &word, run).await;
            if !outcome.is_success() {
                return outcome.into();
            }
            cycles = cycles.saturating_add(1);

            if cycles_remaining(limit, cycles) {
                let delay = self.state.timing().next_delay;
                if !self.pause(run, delay).await {
                    return RunEndReason::Cancelled;
                }
                if !self.publish(run, |w| w.set_display(leading)) {
                    return RunEndReason::Cancelled;
                }
                tokio::task::yield_now().await;
            }
        }

        let finished = self.publish(run, |w| {
            w.set_activity(PlaybackActivity::Idle);
            w.set_display(DisplayMode::Both);
        });
        if finished {
            info!("Repeat finished after {} cycles on word {}", cycles, index);
            RunEndReason::Completed
        } else {
            RunEndReason::Cancelled
        }
    }
}
