//! Error types for the position oracle
//!
//! Every rule-level failure surfaces as a value: an illegal move request, a
//! corrupt or incompatible notation record, or a malformed move descriptor.
//! Callers branch on the outcome instead of relying on unwinding.

use thiserror::Error;

/// Errors that can occur while applying moves or loading notation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The requested move is not legal in the current position
    #[error("Illegal move: {descriptor}")]
    IllegalMove { descriptor: String },

    /// A notation record could not be replayed
    ///
    /// `ply` is the zero-based index of the move token that failed, or the
    /// number of tokens read so far when the failure is structural.
    #[error("Notation error at ply {ply}: {reason}")]
    Notation { ply: usize, reason: String },

    /// A `<from><to><promotion?>` token could not be parsed
    #[error("Invalid move descriptor '{input}'")]
    InvalidDescriptor { input: String },
}

impl OracleError {
    pub(crate) fn notation(ply: usize, reason: impl Into<String>) -> Self {
        OracleError::Notation {
            ply,
            reason: reason.into(),
        }
    }
}

/// Result type alias for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;
