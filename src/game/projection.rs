//! Board projection
//!
//! Pure mapping from the timeline to what a board widget needs to draw and
//! which input it should accept. Holds no state; recompute after every
//! mutation.

use std::collections::BTreeMap;

use chess_oracle::{Color, GameStatus, PositionOracle, Square};

use crate::game::timeline::MoveTimeline;

/// Display-ready board state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDescriptor {
    /// FEN of the position at the cursor
    pub fen: String,
    /// Side shown at the bottom
    pub orientation: Color,
    pub turn: Color,
    pub check: bool,
    pub status: GameStatus,
    /// Origin and destination of the move that led here
    pub last_move: Option<(Square, Square)>,
    /// Legal destinations per origin square; empty when not movable
    pub destinations: BTreeMap<Square, Vec<Square>>,
    /// Whether the board accepts input at all
    pub movable: bool,
    pub movable_color: Option<Color>,
}

/// Project the timeline for a viewer playing `playing_color`
///
/// The board is frozen while browsing history, once the game is over, and
/// for spectators (`None`).
pub fn project<P: PositionOracle>(
    timeline: &MoveTimeline<P>,
    playing_color: Option<Color>,
) -> BoardDescriptor {
    let position = timeline.position();
    let status = position.status();
    let movable = playing_color.is_some() && !timeline.is_browsing() && !status.is_terminal();

    let destinations = if movable {
        Square::ALL
            .iter()
            .filter_map(|&square| {
                let targets = position.legal_destinations(square);
                (!targets.is_empty()).then_some((square, targets))
            })
            .collect()
    } else {
        BTreeMap::new()
    };

    BoardDescriptor {
        fen: position.fingerprint(),
        orientation: playing_color.unwrap_or(Color::White),
        turn: position.turn(),
        check: position.is_check(),
        status,
        last_move: timeline.last_move().map(|mv| (mv.from(), mv.to())),
        destinations,
        movable,
        movable_color: if movable { playing_color } else { None },
    }
}
