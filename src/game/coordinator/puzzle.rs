//! Scripted puzzle line
//!
//! A puzzle is a start FEN plus the moves of its solution. The first move is
//! the opponent's setup move and is played automatically; the player answers
//! with every second move after it, and the script replies in between.

use chess_oracle::{opponent, Color, MoveDescriptor};

use crate::core::error::{GameError, GameResult};

/// Solution line of a puzzle and how far it has been played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleLine {
    fen: String,
    moves: Vec<MoveDescriptor>,
    cursor: usize,
}

impl PuzzleLine {
    pub fn new(fen: impl Into<String>, moves: Vec<MoveDescriptor>) -> Self {
        Self {
            fen: fen.into(),
            moves,
            cursor: 0,
        }
    }

    /// Build from a FEN and a space-separated move list (`"e2e4 e7e5 ..."`)
    pub fn parse(fen: &str, moves: &str) -> GameResult<Self> {
        let moves = moves
            .split_whitespace()
            .map(|token| token.parse::<MoveDescriptor>().map_err(GameError::from))
            .collect::<GameResult<Vec<_>>>()?;
        Ok(Self::new(fen, moves))
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// Side that plays the setup move (the side to move in the FEN)
    pub fn setup_color(&self) -> Color {
        match self.fen.split_whitespace().nth(1) {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }

    /// Side the solver plays: the colour of the second move
    pub fn player_color(&self) -> Color {
        opponent(self.setup_color())
    }

    /// Next move the script expects, from either side
    pub fn expected(&self) -> Option<MoveDescriptor> {
        self.moves.get(self.cursor).copied()
    }

    /// The expected move when it is the solver's to find
    pub fn hint(&self) -> Option<MoveDescriptor> {
        if self.cursor % 2 == 1 {
            self.expected()
        } else {
            None
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.moves.len()
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_complete() {
            self.cursor += 1;
        }
    }
}
