//! Test helpers for hzf-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingSpeech: speech fake that records what was said, when, and what
//!   the session looked like at that moment
//! - TestSession: scheduler wired to a small in-memory deck
//! - Time and event helpers for paused-clock tests

#![allow(dead_code)]

use async_trait::async_trait;
use hzf_common::events::StudyEvent;
use hzf_common::{DisplayMode, Language, WordPair};
use hzf_player::playback::RepeatCount;
use hzf_player::speech::{SpeechError, SpeechService};
use hzf_player::{PlaybackScheduler, SessionState, TimingSettings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

const WORDS: [(&str, &str); 5] = [
    ("你好", "Hello"),
    ("谢谢", "Thank you"),
    ("再见", "Goodbye"),
    ("水", "Water"),
    ("书", "Book"),
];

/// First `n` words of a fixed five-word deck
pub fn words(n: usize) -> Vec<WordPair> {
    WORDS
        .iter()
        .take(n)
        .map(|(zh, en)| WordPair::new(*zh, *en))
        .collect()
}

pub fn timing(language_gap: f64, next_delay: f64, repeat_count: u32) -> TimingSettings {
    TimingSettings {
        language_gap,
        next_delay,
        repeat_count: RepeatCount::new(repeat_count),
    }
}

/// One recorded speak call
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechCall {
    /// Time since the fake was created
    pub at: Duration,
    pub language: Language,
    pub text: String,
    /// Display mode when the call was made
    pub display: DisplayMode,
    /// Spoken indicator when the call was made
    pub spoken: Option<Language>,
}

/// Speech fake that takes a fixed time per utterance
pub struct RecordingSpeech {
    origin: Instant,
    state: Arc<SessionState>,
    utterance: Duration,
    calls: Mutex<Vec<SpeechCall>>,
    fail_on: Mutex<Option<String>>,
    stops: AtomicUsize,
}

impl RecordingSpeech {
    pub fn new(state: Arc<SessionState>, utterance: Duration) -> Self {
        Self {
            origin: Instant::now(),
            state,
            utterance,
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.text).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Fail every utterance of `text` (None to stop failing)
    pub fn fail_on(&self, text: Option<&str>) {
        *self.fail_on.lock().unwrap() = text.map(str::to_string);
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    async fn say(&self, language: Language, text: &str) -> Result<(), SpeechError> {
        self.calls.lock().unwrap().push(SpeechCall {
            at: self.origin.elapsed(),
            language,
            text: text.to_string(),
            display: self.state.display_mode(),
            spoken: self.state.currently_spoken(),
        });

        if self.fail_on.lock().unwrap().as_deref() == Some(text) {
            return Err(SpeechError::Synthesis(format!("no voice for '{}'", text)));
        }
        if !self.utterance.is_zero() {
            tokio::time::sleep(self.utterance).await;
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechService for RecordingSpeech {
    async fn speak_chinese(&self, text: &str) -> Result<(), SpeechError> {
        self.say(Language::Chinese, text).await
    }

    async fn speak_english(&self, text: &str) -> Result<(), SpeechError> {
        self.say(Language::English, text).await
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scheduler over an in-memory deck with a recording speech fake
pub struct TestSession {
    pub scheduler: PlaybackScheduler,
    pub state: Arc<SessionState>,
    pub speech: Arc<RecordingSpeech>,
}

impl TestSession {
    pub fn new(words: Vec<WordPair>, timing: TimingSettings, utterance: Duration) -> Self {
        let state = Arc::new(SessionState::new(words.len(), timing));
        let speech = Arc::new(RecordingSpeech::new(Arc::clone(&state), utterance));
        let scheduler = PlaybackScheduler::with_state(
            Arc::clone(&state),
            Arc::new(words),
            speech.clone(),
        );
        Self {
            scheduler,
            state,
            speech,
        }
    }
}

/// Let virtual time pass
pub async fn run_for(seconds: f64) {
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}

/// Assert `actual` is within 10ms of `expected_secs`
pub fn assert_at(actual: Duration, expected_secs: f64) {
    let diff = (actual.as_secs_f64() - expected_secs).abs();
    assert!(
        diff < 0.01,
        "expected ~{}s, got {:?}",
        expected_secs,
        actual
    );
}

/// Everything currently queued on `rx`
pub fn drain(rx: &mut broadcast::Receiver<StudyEvent>) -> Vec<StudyEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
