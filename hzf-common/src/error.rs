//! Common error types for HanziFlip

use thiserror::Error;

/// Common result type for HanziFlip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the study crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Deck file could not be parsed
    #[error("Deck parse error: {0}")]
    DeckParse(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
