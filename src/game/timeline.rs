//! Move timeline
//!
//! Ordered history of the moves applied to the live position, plus a cursor
//! that can move backward and forward without discarding the moves ahead of
//! it.
//!
//! # Architecture
//!
//! The timeline is two stacks around the cursor:
//!
//! - `played`: moves applied to the position, oldest first
//! - `undone`: moves taken back, the next one to redo on top
//!
//! `played ++ reverse(undone)` is always the full move order of the game, and
//! the position always equals the replay of `played` from the start. Stepping
//! moves a single record between the stacks and mirrors it on the position
//! and the [`MaterialLedger`]. Playing a new move while browsing discards the
//! redo stack.
//!
//! # Integration
//!
//! Owned by the [`crate::game::coordinator::MoveCoordinator`], which hands out
//! shared references only. Read by [`crate::game::projection::project`] to
//! build the board view.

use chess_oracle::{ChessPosition, Move, MoveDescriptor, PositionOracle};
use tracing::{debug, error, info};

use crate::core::error::GameResult;
use crate::game::material::{Delta, MaterialLedger};

/// Outcome of recording a new move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    /// The move as applied by the oracle
    pub mv: Move,
    /// How many redo moves were thrown away to make room for it
    pub discarded: usize,
}

/// History of applied moves with an undo/redo cursor
#[derive(Debug, Clone)]
pub struct MoveTimeline<P: PositionOracle = ChessPosition> {
    position: P,
    played: Vec<Move>,
    /// Redo stack; the last element is the next move forward
    undone: Vec<Move>,
    material: MaterialLedger,
}

impl Default for MoveTimeline<ChessPosition> {
    fn default() -> Self {
        Self::with_position(ChessPosition::new())
    }
}

impl MoveTimeline<ChessPosition> {
    /// Empty timeline on the standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline replaying a notation record
    pub fn from_notation(notation: &str) -> GameResult<Self> {
        let mut timeline = Self::new();
        timeline.reset(notation)?;
        Ok(timeline)
    }
}

impl<P: PositionOracle> MoveTimeline<P> {
    /// Wrap a position that is at its starting point (no moves applied)
    pub fn with_position(position: P) -> Self {
        Self {
            position,
            played: Vec::new(),
            undone: Vec::new(),
            material: MaterialLedger::default(),
        }
    }

    /// Replace the whole history with the replay of `notation`
    ///
    /// On failure nothing changes.
    pub fn reset(&mut self, notation: &str) -> GameResult<()> {
        let moves = self.position.load_from_notation(notation)?;
        self.material = MaterialLedger::recompute(&moves);
        self.played = moves;
        self.undone.clear();
        info!("[TIMELINE] Reset to {} moves", self.played.len());
        Ok(())
    }

    /// Take back the last played move, keeping it for redo
    pub fn step_back(&mut self) -> Option<Move> {
        if self.played.is_empty() {
            return None;
        }
        let taken_back = self.position.undo()?;
        let mv = self.played.pop()?;
        debug_assert_eq!(taken_back, mv, "oracle and timeline disagree on the last move");

        self.material.apply_delta(&mv, Delta::Subtract);
        self.undone.push(mv.clone());
        debug!("[TIMELINE] Back to ply {} ({} to redo)", self.played.len(), self.undone.len());
        Some(mv)
    }

    /// Replay the next undone move
    pub fn step_forward(&mut self) -> Option<Move> {
        let next = self.undone.last()?.descriptor();
        match self.position.apply(&next) {
            Ok(mv) => {
                self.undone.pop();
                self.material.apply_delta(&mv, Delta::Add);
                self.played.push(mv.clone());
                debug!("[TIMELINE] Forward to ply {}", self.played.len());
                Some(mv)
            }
            Err(e) => {
                error!("[TIMELINE] Redo of {} rejected by the position: {}", next, e);
                None
            }
        }
    }

    /// Step back to the starting position, returning the number of steps
    pub fn jump_to_start(&mut self) -> usize {
        let mut steps = 0;
        while self.step_back().is_some() {
            steps += 1;
        }
        steps
    }

    /// Step forward to the newest move, returning the number of steps
    pub fn jump_to_end(&mut self) -> usize {
        let mut steps = 0;
        while self.step_forward().is_some() {
            steps += 1;
        }
        steps
    }

    /// Play a new move at the cursor, discarding any redo history
    pub fn record_new_move(&mut self, descriptor: &MoveDescriptor) -> GameResult<RecordedMove> {
        let mv = self.position.apply(descriptor)?;
        Ok(self.push_recorded(mv))
    }

    /// Play a new move given as a SAN token
    pub fn record_new_token(&mut self, token: &str) -> GameResult<RecordedMove> {
        let mv = self.position.apply_token(token)?;
        Ok(self.push_recorded(mv))
    }

    /// Remove the last played move without keeping it for redo
    pub(crate) fn retract_last(&mut self) -> Option<Move> {
        if self.played.is_empty() {
            return None;
        }
        self.position.undo()?;
        let mv = self.played.pop()?;
        self.material.apply_delta(&mv, Delta::Subtract);
        Some(mv)
    }

    fn push_recorded(&mut self, mv: Move) -> RecordedMove {
        let discarded = self.undone.len();
        if discarded > 0 {
            info!("[TIMELINE] New move {} discards {} undone moves", mv.san(), discarded);
            self.undone.clear();
        }
        self.material.apply_delta(&mv, Delta::Add);
        self.played.push(mv.clone());
        RecordedMove { mv, discarded }
    }

    pub fn played(&self) -> &[Move] {
        &self.played
    }

    /// Undone moves, next-to-redo first
    pub fn undone(&self) -> impl Iterator<Item = &Move> + '_ {
        self.undone.iter().rev()
    }

    pub fn undone_len(&self) -> usize {
        self.undone.len()
    }

    /// Whether the cursor is behind the newest move
    pub fn is_browsing(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.played.last()
    }

    /// Number of moves played up to the cursor
    pub fn ply(&self) -> usize {
        self.played.len()
    }

    /// The whole game line, `played ++ reverse(undone)`
    pub fn line(&self) -> impl Iterator<Item = &Move> + '_ {
        self.played.iter().chain(self.undone.iter().rev())
    }

    /// Notation of the moves up to the cursor
    pub fn played_notation(&self) -> String {
        self.position.to_notation()
    }

    /// Notation of the whole game line, including undone moves
    pub fn line_notation(&self) -> String {
        let line: Vec<Move> = self.line().cloned().collect();
        self.position.notation_of(&line)
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn material(&self) -> &MaterialLedger {
        &self.material
    }
}
