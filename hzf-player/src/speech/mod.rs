//! Speech service seam
//!
//! The scheduler drives text-to-speech through [`SpeechService`]. Each call
//! resolves when the utterance has finished; [`SpeechService::stop`] is called
//! synchronously whenever playback is cancelled.

mod console;

pub use console::{ConsoleSpeech, VoiceSettings};

use async_trait::async_trait;
use hzf_common::Language;
use thiserror::Error;

/// Speech failures; always soft from the scheduler's point of view
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    /// Utterance was stopped before it finished
    #[error("Speech interrupted")]
    Interrupted,

    /// Engine rejected or failed the utterance
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),
}

/// Text-to-speech used by the playback scheduler
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn speak_chinese(&self, text: &str) -> Result<(), SpeechError>;

    async fn speak_english(&self, text: &str) -> Result<(), SpeechError>;

    /// Stop any utterance in flight
    fn stop(&self) {}
}

/// Dispatch to the speak operation for `language`
pub async fn speak(
    service: &dyn SpeechService,
    language: Language,
    text: &str,
) -> Result<(), SpeechError> {
    match language {
        Language::Chinese => service.speak_chinese(text).await,
        Language::English => service.speak_english(text).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        said: Mutex<Vec<(Language, String)>>,
    }

    #[async_trait]
    impl SpeechService for Recorder {
        async fn speak_chinese(&self, text: &str) -> Result<(), SpeechError> {
            self.said
                .lock()
                .unwrap()
                .push((Language::Chinese, text.to_string()));
            Ok(())
        }

        async fn speak_english(&self, text: &str) -> Result<(), SpeechError> {
            Err(SpeechError::Synthesis(format!("no English voice for '{}'", text)))
        }
    }

    #[tokio::test]
    async fn test_speak_dispatches_by_language() {
        let recorder = Recorder {
            said: Mutex::new(Vec::new()),
        };

        speak(&recorder, Language::Chinese, "水").await.unwrap();
        let err = speak(&recorder, Language::English, "Water")
            .await
            .unwrap_err();

        assert_eq!(
            *recorder.said.lock().unwrap(),
            vec![(Language::Chinese, "水".to_string())]
        );
        assert_eq!(
            err.to_string(),
            "Speech synthesis failed: no English voice for 'Water'"
        );
        assert_eq!(SpeechError::Interrupted.to_string(), "Speech interrupted");
    }
}
