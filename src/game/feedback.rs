//! Move feedback classification
//!
//! Every move that reaches the board carries a [`MoveCue`] (what kind of
//! sound or flash a UI should play) and a [`MoveOrigin`] (who made it), so a
//! notification for an opponent or engine move never looks like the user's
//! own move.

use chess_oracle::Move;

/// Feedback cue for a played move, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCue {
    GameOver,
    Check,
    Castle,
    Capture,
    Move,
}

impl MoveCue {
    /// Pick the highest-priority cue that applies to `mv`
    pub fn for_move(mv: &Move) -> Self {
        if mv.is_checkmate() {
            MoveCue::GameOver
        } else if mv.is_check() {
            MoveCue::Check
        } else if mv.flags().is_castle() {
            MoveCue::Castle
        } else if mv.captured().is_some() {
            MoveCue::Capture
        } else {
            MoveCue::Move
        }
    }
}

/// Who produced a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOrigin {
    /// The local user
    Local,
    /// The remote authority (opponent move or resync)
    Remote,
    /// The engine worker
    Engine,
    /// A puzzle's scripted line
    Script,
}
