//! # HanziFlip Common Library
//!
//! Shared code for the HanziFlip study crates including:
//! - Study event types (StudyEvent enum) and the EventBus
//! - Playback mode, display and language enumerations
//! - Configuration loading (CLI > environment > TOML > defaults)
//! - Vocabulary deck model and sample deck
//! - Human-readable time formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod vocabulary;

pub use error::{Error, Result};
pub use events::{DisplayMode, Language, PlaybackMode};
pub use vocabulary::{Deck, VocabularyWord, WordPair};
