//! Optimistic move coordinator
//!
//! Applies a local move at once, tells the caller what must happen next
//! (submit it, ask the engine, schedule a scripted reply) and later
//! reconciles whatever the outside world says about the game.
//!
//! # Move attempts
//!
//! Each local move runs `Idle -> Applying -> Confirmed | Rejected`. Only one
//! attempt may be `Applying`; a second submission fails with
//! [`GameError::Busy`]. Modes whose moves confirm themselves skip straight to
//! `Confirmed`.
//!
//! # Reconciling a pushed record
//!
//! The pushed move line is compared with the local line
//! (`played ++ reverse(undone)`):
//!
//! - **equal**: nothing to do (an echo of what we already show)
//! - **strict extension, not browsing**: only the new suffix is played, so
//!   material updates incrementally and the last appended move is "new"
//! - **anything else** (divergence, a push lagging behind our optimistic
//!   move, or a push arriving while browsing): full reset from the pushed
//!   notation; redo history is lost
//!
//! There is no timeout and no automatic rollback. A move the authority never
//! acknowledges stays on the board until the next push or reload.

use chess_oracle::{ChessPosition, Color, Move, MoveDescriptor, PositionOracle};
use tracing::{debug, info, warn};

use crate::core::error::{GameError, GameResult};
use crate::game::coordinator::authority::{Confirmation, GameMode};
use crate::game::coordinator::pending::{PendingSubmission, SubmissionPhase};
use crate::game::coordinator::puzzle::PuzzleLine;
use crate::game::feedback::MoveOrigin;
use crate::game::projection::{project, BoardDescriptor};
use crate::game::timeline::MoveTimeline;
use crate::remote::MoveSubmission;

/// Follow-up the session must perform after a local move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send the move to the remote authority
    Remote(MoveSubmission),
    /// Ask the engine for its answer
    EngineRequest,
    /// Play this scripted move after the reply delay
    ScriptedReply(MoveDescriptor),
}

/// Result of a local move submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub mv: Move,
    /// Undone moves thrown away by playing from a browsed position
    pub discarded: usize,
    pub phase: SubmissionPhase,
    pub outbound: Option<Outbound>,
}

/// How a pushed record was merged into the local state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The push matched what is already shown
    Echo,
    /// New moves were appended; the last one is the newest
    Extended { appended: Vec<Move> },
    /// Local state was replaced by the pushed record
    Resynced { last: Option<Move> },
}

/// Single owner of a game's timeline, parameterized by game mode
#[derive(Debug, Clone)]
pub struct MoveCoordinator<P: PositionOracle = ChessPosition> {
    timeline: MoveTimeline<P>,
    mode: GameMode,
    pending: PendingSubmission,
}

impl MoveCoordinator<ChessPosition> {
    /// New game for `mode`; puzzles start from their FEN
    pub fn new(mode: GameMode) -> GameResult<Self> {
        let position = match &mode {
            GameMode::Puzzle(puzzle) => ChessPosition::from_fen(puzzle.fen())?,
            _ => ChessPosition::new(),
        };
        Ok(Self::with_timeline(MoveTimeline::with_position(position), mode))
    }

    /// Game for `mode` resumed from a notation record
    pub fn from_notation(mode: GameMode, notation: &str) -> GameResult<Self> {
        let mut coordinator = Self::new(mode)?;
        coordinator.timeline.reset(notation)?;
        Ok(coordinator)
    }
}

impl<P: PositionOracle> MoveCoordinator<P> {
    pub fn with_timeline(timeline: MoveTimeline<P>, mode: GameMode) -> Self {
        Self {
            timeline,
            mode,
            pending: PendingSubmission::default(),
        }
    }

    /// Apply a local move and report what must follow
    ///
    /// On any error nothing is changed. Games confirmed by the authority or
    /// the engine refuse moves while history is being browsed; a local board
    /// branches from the browsed position instead.
    pub fn submit_move(&mut self, descriptor: &MoveDescriptor) -> GameResult<Submission> {
        if self.pending.is_pending() {
            warn!("[COORDINATOR] Move {} refused: previous move unconfirmed", descriptor);
            return Err(GameError::Busy);
        }
        if matches!(self.mode, GameMode::Puzzle(_)) {
            return self.submit_puzzle_move(descriptor);
        }
        if self.timeline.is_browsing() && self.mode.confirmation() != Confirmation::Echo {
            debug!(
                "[COORDINATOR] {} refused: browsing {} moves back",
                descriptor,
                self.timeline.undone_len()
            );
            return Err(GameError::Browsing);
        }

        self.ensure_player_turn(descriptor)?;
        let recorded = self.timeline.record_new_move(descriptor)?;
        let ply = self.timeline.ply() - 1;
        let applied = recorded.mv.descriptor();

        let outbound = match &self.mode {
            GameMode::Online {
                game_id, player, ..
            } => {
                self.pending.request(applied, ply);
                Some(Outbound::Remote(MoveSubmission::new(*game_id, player.clone(), applied)))
            }
            GameMode::Versus { .. } if !self.timeline.position().is_game_over() => {
                self.pending.request(applied, ply);
                Some(Outbound::EngineRequest)
            }
            _ => {
                self.pending.confirm_now(ply);
                None
            }
        };

        info!("[COORDINATOR] Played {} at ply {}", recorded.mv.san_with_suffix(), ply);
        Ok(Submission {
            mv: recorded.mv,
            discarded: recorded.discarded,
            phase: self.pending.phase(),
            outbound,
        })
    }

    fn submit_puzzle_move(&mut self, descriptor: &MoveDescriptor) -> GameResult<Submission> {
        let expected = match self.puzzle() {
            Some(puzzle) if puzzle.is_complete() => return Err(GameError::PuzzleCompleted),
            Some(puzzle) => puzzle.expected(),
            None => None,
        };

        // Recover from a browsed or desynced cursor before judging the move
        let rewound = self.timeline.jump_to_end();
        if let Err(e) = self.ensure_player_turn(descriptor) {
            self.restore_cursor(rewound);
            return Err(e);
        }
        let recorded = match self.timeline.record_new_move(descriptor) {
            Ok(recorded) => recorded,
            Err(e) => {
                self.restore_cursor(rewound);
                return Err(e);
            }
        };
        let ply = self.timeline.ply() - 1;
        let solves = expected
            .is_some_and(|e| e.from == recorded.mv.from() && e.to == recorded.mv.to());

        if !solves {
            self.timeline.retract_last();
            self.pending.reject_now(ply);
            info!("[COORDINATOR] Puzzle move {} is not the solution", recorded.mv.san());
            return Ok(Submission {
                mv: recorded.mv,
                discarded: recorded.discarded,
                phase: self.pending.phase(),
                outbound: None,
            });
        }

        self.pending.confirm_now(ply);
        let reply = self.puzzle_mut().and_then(|puzzle| {
            puzzle.advance();
            puzzle.expected()
        });
        if reply.is_none() {
            info!("[COORDINATOR] Puzzle solved");
        }

        Ok(Submission {
            mv: recorded.mv,
            discarded: recorded.discarded,
            phase: self.pending.phase(),
            outbound: reply.map(Outbound::ScriptedReply),
        })
    }

    /// Record a move made by the engine or a puzzle script
    ///
    /// Engine moves must be for the engine's side; scripted moves must be the
    /// next move of the script. Settles a waiting local attempt.
    pub fn apply_incoming_move(
        &mut self,
        descriptor: &MoveDescriptor,
        origin: MoveOrigin,
    ) -> GameResult<Move> {
        let illegal = || GameError::IllegalMove {
            descriptor: descriptor.to_string(),
        };
        match origin {
            MoveOrigin::Engine => {
                if self.mode.engine_color() != Some(self.timeline.position().turn()) {
                    return Err(illegal());
                }
            }
            MoveOrigin::Script => {
                if self.puzzle().and_then(PuzzleLine::expected) != Some(*descriptor) {
                    return Err(illegal());
                }
                self.timeline.jump_to_end();
            }
            MoveOrigin::Local | MoveOrigin::Remote => {}
        }

        let recorded = self.timeline.record_new_move(descriptor)?;
        if origin == MoveOrigin::Script {
            if let Some(puzzle) = self.puzzle_mut() {
                puzzle.advance();
            }
        }
        self.settle_pending();

        info!("[COORDINATOR] {:?} move {}", origin, recorded.mv.san_with_suffix());
        Ok(recorded.mv)
    }

    /// Merge a pushed canonical record into the local state
    pub fn on_remote_update(&mut self, notation: &str) -> GameResult<Reconciliation> {
        let pushed = self.timeline.position().parse_notation(notation)?;
        let same_start =
            pushed.start.as_deref() == Some(self.timeline.position().initial_fingerprint().as_str());
        let local: Vec<String> = self.timeline.line().map(|mv| mv.san().to_string()).collect();

        let outcome = if same_start && pushed.tokens == local {
            debug!("[COORDINATOR] Push matches local line ({} moves)", local.len());
            Reconciliation::Echo
        } else if same_start
            && !self.timeline.is_browsing()
            && pushed.tokens.len() > local.len()
            && pushed.tokens[..local.len()] == local[..]
        {
            let appended = self.append_tokens(&pushed.tokens[local.len()..])?;
            info!("[COORDINATOR] Push extends local line by {} moves", appended.len());
            Reconciliation::Extended { appended }
        } else {
            self.timeline.reset(notation)?;
            info!("[COORDINATOR] Push diverges from local line, resynced");
            Reconciliation::Resynced {
                last: self.timeline.last_move().cloned(),
            }
        };

        self.settle_pending();
        Ok(outcome)
    }

    /// Play a suffix of tokens, all or nothing
    fn append_tokens(&mut self, tokens: &[String]) -> GameResult<Vec<Move>> {
        let mut appended = Vec::with_capacity(tokens.len());
        for (offset, token) in tokens.iter().enumerate() {
            match self.timeline.record_new_token(token) {
                Ok(recorded) => appended.push(recorded.mv),
                Err(e) => {
                    for _ in 0..appended.len() {
                        self.timeline.retract_last();
                    }
                    warn!("[COORDINATOR] Pushed move {} does not replay: {}", token, e);
                    return Err(GameError::Notation {
                        ply: self.timeline.ply() + offset,
                        reason: format!("'{token}' is not legal at this point"),
                    });
                }
            }
        }
        Ok(appended)
    }

    /// Replace local state with `notation`, keeping any waiting attempt
    ///
    /// Only a pushed record can settle an online attempt here; an engine
    /// attempt waits for the engine's move.
    pub fn resync(&mut self, notation: &str) -> GameResult<()> {
        self.timeline.reset(notation)?;
        if self.mode.confirmation() == Confirmation::Push {
            self.settle_pending();
        }
        Ok(())
    }

    /// The authority turned down the waiting attempt at `ply`
    ///
    /// Returns whether an attempt was rejected; a refusal for an attempt that
    /// already has its verdict is ignored. The move stays on the board until
    /// the authority's record is reconciled.
    pub fn refuse_pending(&mut self, ply: usize) -> bool {
        if self.pending.awaiting_ply() != Some(ply) {
            return false;
        }
        self.pending.reject_now(ply);
        warn!("[COORDINATOR] Move at ply {} refused by the authority", ply);
        true
    }

    /// Forget a waiting attempt without a verdict (reload, engine failure)
    pub fn release_pending(&mut self) {
        if let Some(phase) = self.pending.take() {
            info!("[COORDINATOR] Released unconfirmed attempt {:?}", phase);
        }
    }

    fn settle_pending(&mut self) {
        let Some(ply) = self.pending.awaiting_ply() else {
            return;
        };
        let at_ply = self.timeline.line().nth(ply).cloned();
        match self.pending.settle(at_ply.as_ref()) {
            Some(SubmissionPhase::Rejected { ply }) => {
                warn!("[COORDINATOR] Move at ply {} was replaced by the authority", ply);
            }
            Some(phase) => debug!("[COORDINATOR] Attempt settled: {:?}", phase),
            None => debug!("[COORDINATOR] Attempt at ply {} still waiting", ply),
        }
    }

    /// Step back to where the user was browsing before a refused move
    fn restore_cursor(&mut self, rewound: usize) {
        for _ in 0..rewound {
            self.timeline.step_back();
        }
    }

    fn ensure_player_turn(&self, descriptor: &MoveDescriptor) -> GameResult<()> {
        match self.mode.fixed_color() {
            Some(color) if color != self.timeline.position().turn() => {
                debug!("[COORDINATOR] {} refused: not {:?}'s turn", descriptor, color);
                Err(GameError::IllegalMove {
                    descriptor: descriptor.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn step_back(&mut self) -> Option<Move> {
        self.timeline.step_back()
    }

    pub fn step_forward(&mut self) -> Option<Move> {
        self.timeline.step_forward()
    }

    pub fn jump_to_start(&mut self) -> usize {
        self.timeline.jump_to_start()
    }

    pub fn jump_to_end(&mut self) -> usize {
        self.timeline.jump_to_end()
    }

    /// What to do before the user has moved (engine or script to play first)
    pub fn opening_action(&self) -> Option<Outbound> {
        match &self.mode {
            GameMode::Versus { .. } if self.engine_to_move() => Some(Outbound::EngineRequest),
            GameMode::Puzzle(puzzle) if puzzle.cursor() == 0 => {
                puzzle.expected().map(Outbound::ScriptedReply)
            }
            _ => None,
        }
    }

    /// Whether the engine should be thinking now
    pub fn engine_to_move(&self) -> bool {
        let position = self.timeline.position();
        self.mode.engine_color() == Some(position.turn()) && !position.is_game_over()
    }

    /// Side the local user may move now
    pub fn playing_color(&self) -> Option<Color> {
        self.mode
            .fixed_color()
            .or_else(|| Some(self.timeline.position().turn()))
    }

    pub fn project(&self) -> BoardDescriptor {
        project(&self.timeline, self.playing_color())
    }

    pub fn timeline(&self) -> &MoveTimeline<P> {
        &self.timeline
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.pending.phase()
    }

    pub fn puzzle(&self) -> Option<&PuzzleLine> {
        match &self.mode {
            GameMode::Puzzle(puzzle) => Some(puzzle),
            _ => None,
        }
    }

    pub fn puzzle_completed(&self) -> bool {
        self.puzzle().is_some_and(PuzzleLine::is_complete)
    }

    fn puzzle_mut(&mut self) -> Option<&mut PuzzleLine> {
        match &mut self.mode {
            GameMode::Puzzle(puzzle) => Some(puzzle),
            _ => None,
        }
    }
}
