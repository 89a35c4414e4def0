//! Playback-related type definitions
//!
//! Supporting types for study playback modes, card display and speech.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Spoken language of one side of a word pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    /// Card side that shows this language
    pub fn display_mode(self) -> DisplayMode {
        match self {
            Language::Chinese => DisplayMode::Chinese,
            Language::English => DisplayMode::English,
        }
    }

    /// BCP 47 locale handed to speech engines
    pub fn locale(self) -> &'static str {
        match self {
            Language::Chinese => "zh-CN",
            Language::English => "en-US",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Chinese => write!(f, "chinese"),
            Language::English => write!(f, "english"),
        }
    }
}

/// Which side(s) of the flashcard should currently be visible
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Chinese,
    English,
    #[default]
    Both,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Chinese => write!(f, "chinese"),
            DisplayMode::English => write!(f, "english"),
            DisplayMode::Both => write!(f, "both"),
        }
    }
}

/// Speech pattern used by both autoplay and repeat
///
/// Autoplay and repeat share this five-valued domain; which of the two is
/// active is tracked separately so they can never run together.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackMode {
    #[default]
    Off,
    Chinese,
    English,
    ChineseToEnglish,
    EnglishToChinese,
}

impl PlaybackMode {
    pub fn is_off(self) -> bool {
        self == PlaybackMode::Off
    }

    /// Languages spoken per cycle, in order
    pub fn languages(self) -> &'static [Language] {
        match self {
            PlaybackMode::Off => &[],
            PlaybackMode::Chinese => &[Language::Chinese],
            PlaybackMode::English => &[Language::English],
            PlaybackMode::ChineseToEnglish => &[Language::Chinese, Language::English],
            PlaybackMode::EnglishToChinese => &[Language::English, Language::Chinese],
        }
    }

    /// First language spoken in a cycle (None when off)
    pub fn leading_language(self) -> Option<Language> {
        self.languages().first().copied()
    }

    /// Display mode derived from the leading language, `Both` when off
    pub fn display_mode(self) -> DisplayMode {
        self.leading_language()
            .map(Language::display_mode)
            .unwrap_or(DisplayMode::Both)
    }
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::Off => write!(f, "off"),
            PlaybackMode::Chinese => write!(f, "chinese"),
            PlaybackMode::English => write!(f, "english"),
            PlaybackMode::ChineseToEnglish => write!(f, "chinese-to-english"),
            PlaybackMode::EnglishToChinese => write!(f, "english-to-chinese"),
        }
    }
}

impl FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(PlaybackMode::Off),
            "chinese" | "zh" => Ok(PlaybackMode::Chinese),
            "english" | "en" => Ok(PlaybackMode::English),
            "chinese-to-english" | "zh-en" => Ok(PlaybackMode::ChineseToEnglish),
            "english-to-chinese" | "en-zh" => Ok(PlaybackMode::EnglishToChinese),
            other => Err(format!("unknown playback mode '{}'", other)),
        }
    }
}

/// Which loop a playback run is executing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum RunKind {
    Autoplay,
    Repeat,
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunKind::Autoplay => write!(f, "Autoplay"),
            RunKind::Repeat => write!(f, "Repeat"),
        }
    }
}

/// Why a playback run stopped
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum RunEndReason {
    /// Run identity went stale (mode change, navigation, stop)
    Cancelled,
    /// Repeat loop reached its configured count
    Completed,
    /// No word at the run's index
    WordMissing,
    /// Speech service reported an error
    SpeechFailed,
}

impl std::fmt::Display for RunEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunEndReason::Cancelled => write!(f, "Cancelled"),
            RunEndReason::Completed => write!(f, "Completed"),
            RunEndReason::WordMissing => write!(f, "WordMissing"),
            RunEndReason::SpeechFailed => write!(f, "SpeechFailed"),
        }
    }
}
