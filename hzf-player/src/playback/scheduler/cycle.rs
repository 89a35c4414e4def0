//! One speech cycle over a single word

use super::core::SchedulerInner;
use crate::playback::run::PlaybackRun;
use crate::speech::SpeechError;
use hzf_common::events::StudyEvent;
use hzf_common::{PlaybackMode, WordPair};
use tracing::{debug, warn};

/// Result of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every language in the mode was spoken
    Completed,
    /// The run went stale part-way through
    Cancelled,
    /// The speech service failed while the run was current
    Failed(SpeechError),
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Completed)
    }
}

impl SchedulerInner {
    /// Speak `word` once according to `mode`
    ///
    /// Each language shows its card side and sets the spoken indicator before
    /// speaking. Dual-language modes wait the live language gap between the
    /// two sides and re-check the run on both sides of that wait. `Off` is a
    /// successful no-op.
    pub(super) async fn play_one_cycle(
        &self,
        mode: PlaybackMode,
        word: &WordPair,
        run: &PlaybackRun,
    ) -> CycleOutcome {
        for (position, &language) in mode.languages().iter().enumerate() {
            if position > 0 {
                let gap = self.state.timing().language_gap;
                if !self.pause(run, gap).await {
                    return CycleOutcome::Cancelled;
                }
            }

            let shown = self.publish(run, |w| {
                w.set_display(language.display_mode());
                w.set_spoken(Some(language));
            });
            if !shown {
                return CycleOutcome::Cancelled;
            }

            let text = word.text(language);
            self.state.events().emit_lossy(StudyEvent::SpeechStarted {
                language,
                text: text.to_string(),
                timestamp: chrono::Utc::now(),
            });

            match self.speak(run, language, text).await {
                Ok(true) => {
                    self.state.events().emit_lossy(StudyEvent::SpeechFinished {
                        language,
                        timestamp: chrono::Utc::now(),
                    });
                }
                Ok(false) => return CycleOutcome::Cancelled,
                Err(e) => {
                    if !self.runs.is_current(run) {
                        debug!("Speech ended by cancellation: {}", e);
                        return CycleOutcome::Cancelled;
                    }
                    warn!("Speech failed for {} '{}': {}", language, text, e);
                    self.state.events().emit_lossy(StudyEvent::SpeechFailed {
                        language,
                        message: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                    return CycleOutcome::Failed(e);
                }
            }
        }

        if self.publish(run, |w| w.set_spoken(None)) {
            CycleOutcome::Completed
        } else {
            CycleOutcome::Cancelled
        }
    }
}
