//! Captured material ledger
//!
//! Tracks pieces captured by each side and the resulting material balance.
//! Kept in step with the timeline incrementally: every step forward adds one
//! move's capture, every step back subtracts it. A full [`MaterialLedger::recompute`]
//! over the played moves must always give the same ledger.
//!
//! # Material Values
//!
//! Standard chess piece values in pawns:
//! - Pawn: 1
//! - Knight/Bishop: 3
//! - Rook: 5
//! - Queen: 9
//! - King: 0 (cannot be captured)
//!
//! # Material Advantage
//!
//! Positive advantage means White is ahead, negative means Black is ahead.
//! Example: If White captured (Rook=5, Pawn=1) and Black captured (Knight=3),
//! White's advantage is (5+1) - 3 = +3 pawns.

use chess_oracle::{kind_index, Color, Move, PieceKind};

/// Direction of an incremental ledger update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// The move was played (step forward, new move)
    Add,
    /// The move was taken back (step back)
    Subtract,
}

/// Captures credited to one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideMaterial {
    /// Captured pieces per kind, indexed like [`chess_oracle::PIECE_KINDS`]
    pub captures: [u32; 6],
    /// Sum of the captured pieces' values
    pub total: u32,
}

impl SideMaterial {
    /// How many pieces of `kind` this side has captured
    pub fn count(&self, kind: PieceKind) -> u32 {
        self.captures[kind_index(kind)]
    }
}

/// Captured material for both sides
///
/// # Usage
///
/// ```rust,ignore
/// ledger.apply_delta(&mv, Delta::Add);
/// let advantage = ledger.advantage(); // +9 after White takes the queen
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialLedger {
    white: SideMaterial,
    black: SideMaterial,
}

impl MaterialLedger {
    /// Rebuild the ledger from a played move sequence
    pub fn recompute<'a>(moves: impl IntoIterator<Item = &'a Move>) -> Self {
        let mut ledger = Self::default();
        for mv in moves {
            ledger.apply_delta(mv, Delta::Add);
        }
        ledger
    }

    /// Add or remove one move's capture
    ///
    /// Captures are credited to the side that made the move.
    pub fn apply_delta(&mut self, mv: &Move, delta: Delta) {
        let Some(captured) = mv.captured() else {
            return;
        };
        let side = self.side_mut(mv.color());
        let index = kind_index(captured);
        let value = piece_value(captured);

        match delta {
            Delta::Add => {
                side.captures[index] += 1;
                side.total += value;
            }
            Delta::Subtract => {
                debug_assert!(side.captures[index] > 0, "subtracting an unrecorded capture");
                side.captures[index] = side.captures[index].saturating_sub(1);
                side.total = side.total.saturating_sub(value);
            }
        }
    }

    pub fn side(&self, color: Color) -> &SideMaterial {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// White's total minus Black's total
    pub fn advantage(&self) -> i32 {
        self.white.total as i32 - self.black.total as i32
    }

    fn side_mut(&mut self, color: Color) -> &mut SideMaterial {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}

/// Material value of a piece in pawns
///
/// King has value 0 as it cannot be captured (game ends in checkmate).
pub fn piece_value(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 3,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 0,
    }
}
