//! Console speech service
//!
//! Logs each utterance and holds it for a simulated speaking time derived from
//! the text length and voice speed. Used by the console driver where no speech
//! engine is attached.

use super::{SpeechError, SpeechService};
use async_trait::async_trait;
use hzf_common::config::VOICE_SPEED_RANGE;
use hzf_common::Language;
use std::sync::{Mutex, PoisonError, RwLock};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Fixed lead-in before every utterance
const UTTERANCE_BASE_MS: u64 = 250;
/// Simulated time per Chinese character
const CHINESE_CHAR_MS: u64 = 350;
/// Simulated time per English character
const ENGLISH_CHAR_MS: u64 = 70;

/// Voice options applied to every utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    /// Rate multiplier, clamped to the accepted range
    pub speed: f64,
    /// Resolve immediately without speaking
    pub muted: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            muted: false,
        }
    }
}

/// Speech service that "speaks" into the log
pub struct ConsoleSpeech {
    voice: RwLock<VoiceSettings>,
    interrupt: Mutex<CancellationToken>,
}

impl ConsoleSpeech {
    pub fn new(voice: VoiceSettings) -> Self {
        let console = Self {
            voice: RwLock::new(VoiceSettings::default()),
            interrupt: Mutex::new(CancellationToken::new()),
        };
        console.set_voice(voice);
        console
    }

    pub fn voice(&self) -> VoiceSettings {
        *self.voice.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_voice(&self, voice: VoiceSettings) {
        let (min, max) = VOICE_SPEED_RANGE;
        let speed = if voice.speed.is_finite() {
            voice.speed.clamp(min, max)
        } else {
            1.0
        };
        *self.voice.write().unwrap_or_else(PoisonError::into_inner) = VoiceSettings {
            speed,
            muted: voice.muted,
        };
    }

    /// Simulated speaking time for `text`
    pub fn utterance_duration(&self, language: Language, text: &str) -> Duration {
        let per_char = match language {
            Language::Chinese => CHINESE_CHAR_MS,
            Language::English => ENGLISH_CHAR_MS,
        };
        let chars = text.chars().filter(|c| !c.is_whitespace()).count() as u64;
        let nominal_ms = UTTERANCE_BASE_MS + per_char * chars;
        Duration::from_millis((nominal_ms as f64 / self.voice().speed) as u64)
    }

    async fn say(&self, language: Language, text: &str) -> Result<(), SpeechError> {
        if self.voice().muted {
            debug!("Voice muted, skipping {} utterance", language);
            return Ok(());
        }

        // A new utterance replaces whatever was speaking
        let token = CancellationToken::new();
        {
            let mut slot = self.interrupt.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, token.clone()).cancel();
        }

        let duration = self.utterance_duration(language, text);
        info!("🔊 [{}] {}", language.locale(), text);

        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = token.cancelled() => Err(SpeechError::Interrupted),
        }
    }
}

impl Default for ConsoleSpeech {
    fn default() -> Self {
        Self::new(VoiceSettings::default())
    }
}

#[async_trait]
impl SpeechService for ConsoleSpeech {
    async fn speak_chinese(&self, text: &str) -> Result<(), SpeechError> {
        self.say(Language::Chinese, text).await
    }

    async fn speak_english(&self, text: &str) -> Result<(), SpeechError> {
        self.say(Language::English, text).await
    }

    fn stop(&self) {
        self.interrupt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}
