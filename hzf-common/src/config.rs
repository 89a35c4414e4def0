//! Study settings loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`HZF_*`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable config file is not fatal: a warning is logged and
//! the remaining sources apply.

use crate::events::PlaybackMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_LANGUAGE_GAP_SECS: f64 = 1.5;
pub const DEFAULT_NEXT_DELAY_SECS: f64 = 2.0;
pub const DEFAULT_REPEAT_COUNT: u32 = 1;
pub const DEFAULT_VOICE_SPEED: f64 = 1.0;

/// Accepted speech rate multipliers
pub const VOICE_SPEED_RANGE: (f64, f64) = (0.5, 2.0);

pub const ENV_LANGUAGE_GAP: &str = "HZF_LANGUAGE_GAP";
pub const ENV_NEXT_DELAY: &str = "HZF_NEXT_DELAY";
pub const ENV_REPEAT_COUNT: &str = "HZF_REPEAT_COUNT";
pub const ENV_VOICE_SPEED: &str = "HZF_VOICE_SPEED";
pub const ENV_VOICE_MUTED: &str = "HZF_VOICE_MUTED";
pub const ENV_AUTOPLAY_MODE: &str = "HZF_AUTOPLAY_MODE";
pub const ENV_DECK: &str = "HZF_DECK";

/// Study session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudySettings {
    /// Seconds between the two languages of one cycle
    pub language_gap: f64,
    /// Seconds between words, or between repeat cycles
    pub next_delay: f64,
    /// Cycles per word when repeating (0 = unbounded)
    pub repeat_count: u32,
    /// Speech rate multiplier
    pub voice_speed: f64,
    /// Skip speech entirely (cycles still run)
    pub voice_muted: bool,
    /// Autoplay mode applied when the session starts
    pub autoplay_mode: PlaybackMode,
    /// JSON deck file (None = built-in sample deck)
    pub deck: Option<PathBuf>,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            language_gap: DEFAULT_LANGUAGE_GAP_SECS,
            next_delay: DEFAULT_NEXT_DELAY_SECS,
            repeat_count: DEFAULT_REPEAT_COUNT,
            voice_speed: DEFAULT_VOICE_SPEED,
            voice_muted: false,
            autoplay_mode: PlaybackMode::Off,
            deck: None,
        }
    }
}

impl StudySettings {
    /// Check that timing and speed values are usable
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("language_gap", self.language_gap), ("next_delay", self.next_delay)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }

        let (min, max) = VOICE_SPEED_RANGE;
        if !(min..=max).contains(&self.voice_speed) {
            return Err(Error::Config(format!(
                "voice_speed must be within {}..={}, got {}",
                min, max, self.voice_speed
            )));
        }

        Ok(())
    }
}

/// Highest-priority values, typically parsed from the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub language_gap: Option<f64>,
    pub next_delay: Option<f64>,
    pub repeat_count: Option<u32>,
    pub voice_speed: Option<f64>,
    pub voice_muted: Option<bool>,
    pub autoplay_mode: Option<PlaybackMode>,
    pub deck: Option<PathBuf>,
}

/// Resolves StudySettings from overrides, environment, config file and defaults
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    config_file: Option<PathBuf>,
}

impl SettingsResolver {
    /// Resolver using the platform config file location
    pub fn new() -> Self {
        Self {
            config_file: default_config_file(),
        }
    }

    /// Resolver reading an explicit config file
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: Some(path.into()),
        }
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Settings from the config file, or defaults if it is missing or invalid
    pub fn load_file(&self) -> StudySettings {
        let Some(path) = &self.config_file else {
            debug!("No config file location; using defaults");
            return StudySettings::default();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<StudySettings>(&content) {
                Ok(settings) => {
                    debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Ignoring invalid config file {}: {}", path.display(), e);
                    StudySettings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found; using defaults", path.display());
                StudySettings::default()
            }
            Err(e) => {
                warn!("Could not read config file {}: {}", path.display(), e);
                StudySettings::default()
            }
        }
    }

    /// Resolve settings by priority and validate the result
    pub fn resolve(&self, overrides: &SettingsOverrides) -> Result<StudySettings> {
        let mut settings = self.load_file();

        // Priority 2: Environment variables
        if let Some(v) = env_value::<f64>(ENV_LANGUAGE_GAP)? {
            settings.language_gap = v;
        }
        if let Some(v) = env_value::<f64>(ENV_NEXT_DELAY)? {
            settings.next_delay = v;
        }
        if let Some(v) = env_value::<u32>(ENV_REPEAT_COUNT)? {
            settings.repeat_count = v;
        }
        if let Some(v) = env_value::<f64>(ENV_VOICE_SPEED)? {
            settings.voice_speed = v;
        }
        if let Some(v) = env_value::<bool>(ENV_VOICE_MUTED)? {
            settings.voice_muted = v;
        }
        if let Some(v) = env_value::<PlaybackMode>(ENV_AUTOPLAY_MODE)? {
            settings.autoplay_mode = v;
        }
        if let Ok(path) = std::env::var(ENV_DECK) {
            settings.deck = Some(PathBuf::from(path));
        }

        // Priority 1: Command-line overrides
        if let Some(v) = overrides.language_gap {
            settings.language_gap = v;
        }
        if let Some(v) = overrides.next_delay {
            settings.next_delay = v;
        }
        if let Some(v) = overrides.repeat_count {
            settings.repeat_count = v;
        }
        if let Some(v) = overrides.voice_speed {
            settings.voice_speed = v;
        }
        if let Some(v) = overrides.voice_muted {
            settings.voice_muted = v;
        }
        if let Some(v) = overrides.autoplay_mode {
            settings.autoplay_mode = v;
        }
        if let Some(path) = &overrides.deck {
            settings.deck = Some(path.clone());
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform config file: `<config_dir>/hanziflip/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hanziflip").join("config.toml"))
}

fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
