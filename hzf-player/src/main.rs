//! HanziFlip Player (hzf-player) - Main entry point
//!
//! Console study session: loads a deck, speaks through the console speech
//! service and takes line commands from stdin.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use clap::Parser;
use hzf_common::config::{SettingsOverrides, SettingsResolver, StudySettings};
use hzf_common::events::StudyEvent;
use hzf_common::{Deck, PlaybackMode};
use hzf_player::console::{Command, StudyConsole, HELP};
use hzf_player::speech::{ConsoleSpeech, VoiceSettings};
use hzf_player::{PlaybackScheduler, TimingSettings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for hzf-player
#[derive(Parser, Debug)]
#[command(name = "hzf-player")]
#[command(about = "Flashcard playback for Chinese/English vocabulary")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/hanziflip/config.toml)
    #[arg(short, long, env = "HZF_CONFIG")]
    config: Option<PathBuf>,

    /// JSON deck to study (default: built-in sample deck)
    #[arg(short, long)]
    deck: Option<PathBuf>,

    /// Start autoplay in this mode
    #[arg(short, long)]
    mode: Option<PlaybackMode>,

    /// Cycles per word when repeating (0 = forever)
    #[arg(long)]
    repeat_count: Option<u32>,

    /// Seconds between the two languages of a cycle
    #[arg(long)]
    language_gap: Option<f64>,

    /// Seconds between words
    #[arg(long)]
    next_delay: Option<f64>,

    /// Speech rate multiplier
    #[arg(long)]
    voice_speed: Option<f64>,

    /// Do not speak (timing still applies)
    #[arg(long)]
    muted: bool,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            language_gap: self.language_gap,
            next_delay: self.next_delay,
            repeat_count: self.repeat_count,
            voice_speed: self.voice_speed,
            voice_muted: self.muted.then_some(true),
            autoplay_mode: self.mode,
            deck: self.deck.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hzf_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let resolver = match &args.config {
        Some(path) => SettingsResolver::with_config_file(path),
        None => SettingsResolver::new(),
    };
    let settings = resolver
        .resolve(&args.overrides())
        .context("Failed to resolve study settings")?;

    let deck = load_deck(&settings)?;
    info!("Studying deck '{}' ({} words)", deck.name, deck.len());
    let deck = Arc::new(RwLock::new(deck));

    let speech = Arc::new(ConsoleSpeech::new(VoiceSettings {
        speed: settings.voice_speed,
        muted: settings.voice_muted,
    }));

    let scheduler = Arc::new(PlaybackScheduler::new(
        deck.clone(),
        speech.clone(),
        TimingSettings::from(&settings),
    ));

    tokio::spawn(log_events(scheduler.state().subscribe_events()));

    if !settings.autoplay_mode.is_off() {
        scheduler.set_autoplay_mode(settings.autoplay_mode);
    }

    let console = StudyConsole::new(scheduler.clone(), deck, speech);
    println!("{}", console.card_line());
    println!("Type 'help' for commands.");

    tokio::select! {
        result = read_commands(&console) => result?,
        _ = shutdown_signal() => {}
    }

    scheduler.shutdown();
    info!(
        "Session ended after {} ({:.0}% of deck)",
        scheduler.state().formatted_time(),
        scheduler.completion_percentage()
    );
    Ok(())
}

fn load_deck(settings: &StudySettings) -> Result<Deck> {
    match &settings.deck {
        Some(path) => Deck::load(path)
            .with_context(|| format!("Failed to load deck {}", path.display())),
        None => Ok(Deck::sample()),
    }
}

/// Apply stdin commands until `quit` or end of input
async fn read_commands(console: &StudyConsole) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                println!("{}", HELP);
                continue;
            }
        };

        match console.execute(command) {
            Ok(Some(reply)) => println!("{}", reply),
            Ok(None) => break,
            Err(e) => println!("{}", e),
        }
    }
    Ok(())
}

/// Log session events as they happen
async fn log_events(mut events: broadcast::Receiver<StudyEvent>) {
    loop {
        match events.recv().await {
            Ok(StudyEvent::IndexChanged {
                index, total_words, ..
            }) => info!("Card {}/{}", index + 1, total_words),
            Ok(StudyEvent::SpeechFailed {
                language, message, ..
            }) => warn!("Speech failed ({}): {}", language, message),
            Ok(event) => debug!("Event: {}", event.event_type()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event logger lagged, skipped {} events", skipped)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
