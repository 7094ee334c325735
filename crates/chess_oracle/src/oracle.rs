//! Position oracle contract
//!
//! The oracle owns the live board and is the only thing that knows the rules.
//! Timelines and coordinators drive it exclusively through this trait, so a
//! different rules engine (or a test double) can be swapped in without
//! touching the reconciliation logic.

use crate::error::OracleResult;
use crate::move_record::Move;
use crate::notation::NotationLine;
use crate::types::{Color, GameStatus, MoveDescriptor, Square};

/// A mutable game position with undo support
///
/// Every mutating method either fully succeeds or leaves the position
/// untouched.
pub trait PositionOracle {
    /// Validate and play a move request
    fn apply(&mut self, descriptor: &MoveDescriptor) -> OracleResult<Move>;

    /// Validate and play a SAN token from a notation record
    fn apply_token(&mut self, token: &str) -> OracleResult<Move>;

    /// Take back the last applied move, returning it
    fn undo(&mut self) -> Option<Move>;

    /// Replace the whole position with the replay of `notation`
    ///
    /// Returns the produced moves in order. On failure the current position
    /// is kept as it was.
    fn load_from_notation(&mut self, notation: &str) -> OracleResult<Vec<Move>>;

    /// Parse notation into a move line without touching the position
    ///
    /// The returned `start` is always a normalized FEN (the standard starting
    /// FEN when the record has no `[FEN]` header), comparable with
    /// [`PositionOracle::initial_fingerprint`].
    fn parse_notation(&self, notation: &str) -> OracleResult<NotationLine>;

    /// Notation for `moves` played from this position's starting point
    fn notation_of(&self, moves: &[Move]) -> String;

    /// Notation for everything applied since the starting point
    fn to_notation(&self) -> String;

    /// Legal destination squares for the piece on `square`
    fn legal_destinations(&self, square: Square) -> Vec<Square>;

    fn status(&self) -> GameStatus;

    fn is_game_over(&self) -> bool {
        self.status().is_terminal()
    }

    fn is_check(&self) -> bool;

    fn turn(&self) -> Color;

    /// Identifier of the current position (FEN)
    fn fingerprint(&self) -> String;

    /// Identifier of the starting position (FEN)
    fn initial_fingerprint(&self) -> String;
}
