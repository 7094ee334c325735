//! Error types for core module
//!
//! [`GameError`] covers everything a game session can refuse or drop: illegal
//! requests, bad notation, concurrency violations and engine failures.
//! [`SettingsError`] covers settings persistence.

use chess_oracle::OracleError;
use thiserror::Error;

/// Errors surfaced by the timeline, coordinator and engine bridge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The position oracle refused the move; nothing was changed
    #[error("Illegal move: {descriptor}")]
    IllegalMove { descriptor: String },

    /// Notation could not be replayed; nothing was changed
    #[error("Notation rejected at ply {ply}: {reason}")]
    Notation { ply: usize, reason: String },

    /// A previous move is still waiting for its confirmation
    #[error("A move is already awaiting confirmation")]
    Busy,

    /// History is being browsed; moves are only taken at the newest position
    #[error("Return to the latest move before playing")]
    Browsing,

    /// The remote authority turned the submission down
    #[error("Move refused by the authority: {reason}")]
    Refused { reason: String },

    /// The engine worker cannot run on this host (checked once, never retried)
    #[error("Engine unavailable: {reason}")]
    UnsupportedEnvironment { reason: String },

    /// An engine answer that no longer belongs to the live position
    #[error("Stale engine response: {response}")]
    StaleEngineResponse { response: String },

    /// Engine process I/O failure
    #[error("Engine worker error: {message}")]
    Worker { message: String },

    /// The scripted puzzle line has been played out
    #[error("Puzzle already completed")]
    PuzzleCompleted,

    /// The session task is gone
    #[error("Game session has stopped")]
    SessionClosed,
}

impl From<OracleError> for GameError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::IllegalMove { descriptor } => GameError::IllegalMove { descriptor },
            OracleError::InvalidDescriptor { input } => GameError::IllegalMove { descriptor: input },
            OracleError::Notation { ply, reason } => GameError::Notation { ply, reason },
        }
    }
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur while persisting settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file I/O error
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings serialization/deserialization error
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;
