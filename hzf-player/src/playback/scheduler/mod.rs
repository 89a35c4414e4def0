//! Playback scheduler
//!
//! **Module Structure:**
//! - `core.rs`: Scheduler struct, run supervision, cancellation and guarded writes
//! - `cycle.rs`: One speech pass over a single word
//! - `loops.rs`: Autoplay and repeat loops
//! - `controls.rs`: Mode setters, navigation and timing controls

mod controls;
mod core;
mod cycle;
mod loops;

pub use self::core::PlaybackScheduler;
pub use cycle::CycleOutcome;
