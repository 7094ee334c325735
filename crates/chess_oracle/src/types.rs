//! # Oracle Types
//!
//! Board coordinates, piece kinds and colours come straight from `shakmaty`
//! and are re-exported under the names the rest of the workspace uses
//! (`Square`, `PieceKind`, `Color`). This module adds the small value types
//! that travel across the oracle boundary:
//!
//! - [`MoveDescriptor`] - a move *request* (`from`, `to`, optional promotion),
//!   written as the `<from><to><promotion?>` token used by UCI engines and the
//!   remote authority (`e2e4`, `e7e8q`).
//! - [`MoveFlags`] - the special-move markers attached to every played move.
//! - [`GameStatus`] - whether the position is still being played.

use std::fmt;
use std::str::FromStr;

use shakmaty::uci::UciMove;

use crate::error::OracleError;

pub use shakmaty::{Color, Role as PieceKind, Square};

/// All six piece kinds, in the order used for per-kind tables
pub const PIECE_KINDS: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

/// Index of a piece kind inside a `[_; 6]` table ordered like [`PIECE_KINDS`]
pub fn kind_index(kind: PieceKind) -> usize {
    match kind {
        PieceKind::Pawn => 0,
        PieceKind::Knight => 1,
        PieceKind::Bishop => 2,
        PieceKind::Rook => 3,
        PieceKind::Queen => 4,
        PieceKind::King => 5,
    }
}

/// The side that does not have `color`
pub fn opponent(color: Color) -> Color {
    match color {
        Color::White => Color::Black,
        Color::Black => Color::White,
    }
}

/// A request to move a piece, before the oracle has validated it
///
/// Castling is requested with the king's destination (`e1g1`); the oracle
/// also accepts the king-takes-rook form (`e1h1`).
///
/// # Example
///
/// ```rust
/// use chess_oracle::{MoveDescriptor, PieceKind, Square};
///
/// let promo: MoveDescriptor = "e7e8q".parse().unwrap();
/// assert_eq!(promo.from, Square::E7);
/// assert_eq!(promo.promotion, Some(PieceKind::Queen));
/// assert_eq!(promo.to_string(), "e7e8q");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveDescriptor {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: PieceKind) -> Self {
        self.promotion = Some(promotion);
        self
    }

    /// The same request as a shakmaty UCI move
    pub fn to_uci(&self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

impl fmt::Display for MoveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.char())?;
        }
        Ok(())
    }
}

impl FromStr for MoveDescriptor {
    type Err = OracleError;

    /// Read a `<from><to><promotion?>` token through shakmaty's UCI parser
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || OracleError::InvalidDescriptor {
            input: input.to_string(),
        };
        let uci: UciMove = input
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| invalid())?;
        match uci {
            UciMove::Normal {
                promotion: Some(PieceKind::Pawn | PieceKind::King),
                ..
            } => Err(invalid()),
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Ok(Self {
                from,
                to,
                promotion,
            }),
            // Drops and null moves are not board requests
            UciMove::Put { .. } | UciMove::Null => Err(invalid()),
        }
    }
}

/// Special-move markers for a played move
///
/// Mirrors the flag letters a rules engine reports (`c` capture, `e` en
/// passant, `k`/`q` castling side, `p` promotion, `b` pawn double push).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags {
    pub capture: bool,
    pub en_passant: bool,
    pub castle_kingside: bool,
    pub castle_queenside: bool,
    pub promotion: bool,
    pub double_push: bool,
}

impl MoveFlags {
    pub fn is_castle(&self) -> bool {
        self.castle_kingside || self.castle_queenside
    }
}

/// Whether the game can continue from a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Draw,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    /// Result token for a finished game (`1-0`, `0-1`, `1/2-1/2`)
    pub fn result_token(&self) -> Option<&'static str> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Checkmate {
                winner: Color::White,
            } => Some("1-0"),
            GameStatus::Checkmate {
                winner: Color::Black,
            } => Some("0-1"),
            GameStatus::Draw => Some("1/2-1/2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_parses_plain_move() {
        //! Four-character tokens carry no promotion
        let descriptor: MoveDescriptor = "g1f3".parse().unwrap();
        assert_eq!(descriptor, MoveDescriptor::new(Square::G1, Square::F3));
    }

    #[test]
    fn test_descriptor_parses_promotion_case_insensitive() {
        let descriptor: MoveDescriptor = "b2b1N".parse().unwrap();
        assert_eq!(descriptor.promotion, Some(PieceKind::Knight));
        assert_eq!(descriptor.to_string(), "b2b1n");
    }

    #[test]
    fn test_descriptor_rejects_garbage() {
        //! Bad squares, bad lengths and impossible promotions are all refused
        for input in ["", "e2", "e2e9", "z2e4", "e7e8k", "e7e8p", "e7e8qq", "é2e4"] {
            assert!(
                matches!(
                    input.parse::<MoveDescriptor>(),
                    Err(OracleError::InvalidDescriptor { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_descriptor_refuses_null_and_drop_moves() {
        for input in ["0000", "Q@e4"] {
            assert!(input.parse::<MoveDescriptor>().is_err(), "{input:?} should be rejected");
        }
        let descriptor: MoveDescriptor = "e1g1".parse().unwrap();
        assert_eq!(descriptor.to_uci().to_string(), "e1g1");
    }

    #[test]
    fn test_kind_index_matches_table_order() {
        for (index, kind) in PIECE_KINDS.iter().enumerate() {
            assert_eq!(kind_index(*kind), index);
        }
    }

    #[test]
    fn test_result_tokens() {
        assert_eq!(GameStatus::Ongoing.result_token(), None);
        assert_eq!(
            GameStatus::Checkmate {
                winner: Color::Black
            }
            .result_token(),
            Some("0-1")
        );
        assert_eq!(GameStatus::Draw.result_token(), Some("1/2-1/2"));
        assert!(GameStatus::Draw.is_terminal());
    }
}
