//! Error types for hzf-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Playback itself never surfaces errors to callers: speech failures and missing
//! words end the current run and are reported through events and logs.

use thiserror::Error;

/// Main error type for hzf-player
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared library (config, deck loading)
    #[error(transparent)]
    Common(#[from] hzf_common::Error),

    /// Console command could not be parsed
    #[error("Bad command: {0}")]
    BadCommand(String),

    /// Operation not possible in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using hzf-player Error
pub type Result<T> = std::result::Result<T, Error>;
