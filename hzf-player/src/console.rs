//! Console study driver
//!
//! Line commands read from stdin are parsed into [`Command`] and applied to
//! the scheduler and deck by [`StudyConsole`]. Each command returns the text
//! to print.

use crate::error::{Error, Result};
use crate::playback::PlaybackScheduler;
use crate::speech::{ConsoleSpeech, VoiceSettings};
use hzf_common::human_time::format_delay;
use hzf_common::{Deck, PlaybackMode};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

pub const HELP: &str = "\
Commands:
  next | n              next card
  prev | p              previous card
  goto N                jump to card N (1-based)
  autoplay MODE         off | chinese | english | chinese-to-english | english-to-chinese
  repeat MODE           repeat the current card (same modes)
  count N               repeat count per card (0 = forever)
  toggle                autoplay repeat on/off
  gap S | delay S       language gap / next delay in seconds
  speed X | mute        voice speed (0.5-2.0) / mute toggle
  shuffle | order       shuffle deck / restore deck order
  fav | right | wrong   mark the current card
  reset                 clear right/wrong marks
  export                print progress as CSV
  stop                  stop all playback
  status                print the session as JSON
  help | quit";

/// One console command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    GoTo(usize),
    Autoplay(PlaybackMode),
    Repeat(PlaybackMode),
    Count(u32),
    ToggleRepeat,
    Gap(f64),
    Delay(f64),
    Speed(f64),
    Mute,
    Shuffle,
    Order,
    Favorite,
    Correct,
    Incorrect,
    ResetProgress,
    Export,
    Stop,
    Status,
    Help,
    Quit,
}

fn argument<T>(name: &str, arg: Option<&str>) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = arg.ok_or_else(|| Error::BadCommand(format!("'{}' needs an argument", name)))?;
    raw.parse::<T>()
        .map_err(|e| Error::BadCommand(format!("{} {}: {}", name, raw, e)))
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(Error::BadCommand("empty command".to_string()));
        };
        let name = name.to_ascii_lowercase();
        let arg = parts.next();

        let command = match name.as_str() {
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Previous,
            "goto" | "g" => {
                let n: usize = argument("goto", arg)?;
                if n == 0 {
                    return Err(Error::BadCommand("cards are numbered from 1".to_string()));
                }
                Command::GoTo(n - 1)
            }
            "autoplay" | "a" => Command::Autoplay(argument("autoplay", arg)?),
            "repeat" | "r" => Command::Repeat(argument("repeat", arg)?),
            "count" => Command::Count(argument("count", arg)?),
            "toggle" | "t" => Command::ToggleRepeat,
            "gap" => Command::Gap(argument("gap", arg)?),
            "delay" => Command::Delay(argument("delay", arg)?),
            "speed" => Command::Speed(argument("speed", arg)?),
            "mute" => Command::Mute,
            "shuffle" => Command::Shuffle,
            "order" => Command::Order,
            "fav" => Command::Favorite,
            "right" => Command::Correct,
            "wrong" => Command::Incorrect,
            "reset" => Command::ResetProgress,
            "export" => Command::Export,
            "stop" | "s" => Command::Stop,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(Error::BadCommand(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }
}

/// Applies console commands to one study session
pub struct StudyConsole {
    scheduler: Arc<PlaybackScheduler>,
    deck: Arc<RwLock<Deck>>,
    speech: Arc<ConsoleSpeech>,
}

impl StudyConsole {
    pub fn new(
        scheduler: Arc<PlaybackScheduler>,
        deck: Arc<RwLock<Deck>>,
        speech: Arc<ConsoleSpeech>,
    ) -> Self {
        Self {
            scheduler,
            deck,
            speech,
        }
    }

    /// Apply `command`; returns the reply to print (None for `Quit`)
    pub fn execute(&self, command: Command) -> Result<Option<String>> {
        let s = &self.scheduler;
        let reply = match command {
            Command::Next => {
                s.go_to_next();
                self.card_line()
            }
            Command::Previous => {
                s.go_to_previous();
                self.card_line()
            }
            Command::GoTo(index) => {
                s.go_to_index(index);
                self.card_line()
            }
            Command::Autoplay(mode) => {
                s.set_autoplay_mode(mode);
                format!("autoplay {}", mode)
            }
            Command::Repeat(mode) => {
                s.set_repeat_mode(mode);
                format!("repeat {}", mode)
            }
            Command::Count(count) => {
                s.set_repeat_count(count);
                format!("repeat count {}", s.state().timing().repeat_count)
            }
            Command::ToggleRepeat => {
                if !s.toggle_autoplay_repeat() {
                    return Err(Error::InvalidState(
                        "autoplay repeat needs autoplay running".to_string(),
                    ));
                }
                let on = s.state().is_autoplay_repeating();
                format!("autoplay repeat {}", if on { "on" } else { "off" })
            }
            Command::Gap(seconds) => {
                s.set_language_gap(seconds);
                format!("language gap {}", format_delay(s.state().timing().language_gap))
            }
            Command::Delay(seconds) => {
                s.set_next_delay(seconds);
                format!("next delay {}", format_delay(s.state().timing().next_delay))
            }
            Command::Speed(speed) => {
                let voice = self.speech.voice();
                self.speech.set_voice(VoiceSettings { speed, ..voice });
                format!("voice speed {:.2}", self.speech.voice().speed)
            }
            Command::Mute => {
                let voice = self.speech.voice();
                self.speech.set_voice(VoiceSettings {
                    muted: !voice.muted,
                    ..voice
                });
                format!("voice {}", if voice.muted { "on" } else { "muted" })
            }
            Command::Shuffle => {
                self.deck_mut().shuffle();
                s.go_to_index(0);
                format!("shuffled; {}", self.card_line())
            }
            Command::Order => {
                self.deck_mut().reset_order();
                s.go_to_index(0);
                format!("deck order; {}", self.card_line())
            }
            Command::Favorite => {
                let id = self.current_word_id()?;
                let favorite = self.deck_mut().toggle_favorite(&id)?;
                format!("favorite {}", if favorite { "on" } else { "off" })
            }
            Command::Correct => {
                let id = self.current_word_id()?;
                self.deck_mut().mark_correct(&id)?;
                self.card_line()
            }
            Command::Incorrect => {
                let id = self.current_word_id()?;
                self.deck_mut().mark_incorrect(&id)?;
                self.card_line()
            }
            Command::ResetProgress => {
                self.deck_mut().reset_progress();
                "progress cleared".to_string()
            }
            Command::Export => self.deck_ref().progress_csv(),
            Command::Stop => {
                s.stop_all();
                "stopped".to_string()
            }
            Command::Status => serde_json::to_string_pretty(&s.state().snapshot())
                .map_err(hzf_common::Error::from)?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(None),
        };
        Ok(Some(reply))
    }

    fn deck_ref(&self) -> std::sync::RwLockReadGuard<'_, Deck> {
        self.deck.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn deck_mut(&self) -> std::sync::RwLockWriteGuard<'_, Deck> {
        self.deck.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_word_id(&self) -> Result<String> {
        let index = self.scheduler.state().current_index();
        self.deck_ref()
            .word_at(index)
            .map(|w| w.id.clone())
            .ok_or_else(|| Error::InvalidState("deck is empty".to_string()))
    }

    /// `[3/20] 谢谢 (xièxie) Thank you ★ ✓`
    pub fn card_line(&self) -> String {
        let state = self.scheduler.state();
        let index = state.current_index();
        let deck = self.deck_ref();
        match deck.word_at(index) {
            Some(word) => {
                let mut line = format!(
                    "[{}/{}] {} ({}) {}",
                    index + 1,
                    deck.len(),
                    word.chinese,
                    word.pinyin,
                    word.english
                );
                if word.favorite {
                    line.push_str(" ★");
                }
                if word.correct_count > 0 {
                    line.push_str(" ✓");
                } else if word.incorrect_count > 0 {
                    line.push_str(" ✗");
                }
                line
            }
            None => "[0/0] empty deck".to_string(),
        }
    }
}
