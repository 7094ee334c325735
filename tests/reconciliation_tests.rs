//! Coordinator integration tests
//!
//! Pushed records against local state, one outstanding move at a time,
//! puzzle scripts, and engine answers that arrive for positions that are
//! gone.

use std::sync::{Arc, Mutex};

use chess_oracle::{Color, Move, MoveDescriptor, PositionOracle};
use chess_timeline::core::error::{GameError, GameResult};
use chess_timeline::core::settings::EngineSettings;
use chess_timeline::game::coordinator::PuzzleLine;
use chess_timeline::game::engine::{
    EngineBridge, EngineOutcome, EngineWorker, UciCommand, WorkerLauncher,
};
use chess_timeline::game::{
    Difficulty, GameId, GameMode, MoveCoordinator, MoveOrigin, Outbound, Reconciliation,
    SubmissionPhase,
};
use tokio::sync::mpsc;

fn descriptor(token: &str) -> MoveDescriptor {
    token.parse().unwrap()
}

fn sans<'a>(moves: impl Iterator<Item = &'a Move>) -> Vec<String> {
    moves.map(|mv| mv.san().to_string()).collect()
}

fn online(color: Color) -> GameMode {
    GameMode::Online {
        game_id: GameId::new(),
        player: "alice".to_string(),
        color,
    }
}

// ============================================================================
// Pushed Records
// ============================================================================

#[test]
fn test_extension_appends_only_new_moves() {
    //! [e4, e5] + push [e4, e5, Nf3]: Nf3 is the only new move
    let mut coordinator = MoveCoordinator::from_notation(GameMode::Local, "1. e4 e5").unwrap();

    let outcome = coordinator.on_remote_update("1. e4 e5 2. Nf3").unwrap();
    match outcome {
        Reconciliation::Extended { appended } => assert_eq!(sans(appended.iter()), ["Nf3"]),
        other => panic!("expected extension, got {other:?}"),
    }
    assert_eq!(sans(coordinator.timeline().played().iter()), ["e4", "e5", "Nf3"]);
    assert_eq!(coordinator.timeline().undone_len(), 0);
}

#[test]
fn test_divergence_resets_and_drops_redo() {
    //! played [e4, e5], undone [Nf3], push [e4, e5, Nc3]
    let mut coordinator =
        MoveCoordinator::from_notation(GameMode::Local, "1. e4 e5 2. Nf3").unwrap();
    coordinator.step_back();
    assert_eq!(sans(coordinator.timeline().undone()), ["Nf3"]);

    let outcome = coordinator.on_remote_update("1. e4 e5 2. Nc3").unwrap();
    match outcome {
        Reconciliation::Resynced { last } => assert_eq!(last.unwrap().san(), "Nc3"),
        other => panic!("expected resync, got {other:?}"),
    }
    assert_eq!(sans(coordinator.timeline().played().iter()), ["e4", "e5", "Nc3"]);
    assert_eq!(coordinator.timeline().undone_len(), 0);
}

#[test]
fn test_push_while_browsing_resyncs() {
    //! An extension seen while browsing still replaces the local state
    let mut coordinator = MoveCoordinator::from_notation(GameMode::Local, "1. e4 e5").unwrap();
    coordinator.jump_to_start();

    let outcome = coordinator.on_remote_update("1. e4 e5 2. Nf3").unwrap();
    assert!(matches!(outcome, Reconciliation::Resynced { .. }));
    assert!(!coordinator.timeline().is_browsing());
    assert_eq!(coordinator.timeline().ply(), 3);
}

#[test]
fn test_duplicate_push_is_echo() {
    let mut coordinator = MoveCoordinator::from_notation(GameMode::Local, "1. d4").unwrap();
    coordinator.on_remote_update("1. d4 Nf6").unwrap();
    assert_eq!(
        coordinator.on_remote_update("1. d4 Nf6").unwrap(),
        Reconciliation::Echo
    );
    assert_eq!(coordinator.timeline().played_notation(), "1. d4 Nf6");
}

#[test]
fn test_result_token_in_push_is_ignored() {
    let mut coordinator =
        MoveCoordinator::from_notation(GameMode::Local, "1. f3 e5 2. g4").unwrap();
    let outcome = coordinator.on_remote_update("1. f3 e5 2. g4 Qh4# 0-1").unwrap();
    assert!(matches!(outcome, Reconciliation::Extended { .. }));
    assert!(coordinator.timeline().position().is_game_over());
    assert!(!coordinator.project().movable);
}

// ============================================================================
// Outstanding Moves
// ============================================================================

#[test]
fn test_second_submission_is_busy() {
    let mut coordinator = MoveCoordinator::new(online(Color::White)).unwrap();
    coordinator.submit_move(&descriptor("e2e4")).unwrap();

    assert_eq!(
        coordinator.submit_move(&descriptor("d2d4")),
        Err(GameError::Busy)
    );
    assert_eq!(coordinator.timeline().played_notation(), "1. e4");

    // The echo releases the lock; the opponent's reply makes it our turn
    coordinator.on_remote_update("1. e4").unwrap();
    coordinator.on_remote_update("1. e4 e5").unwrap();
    assert!(coordinator.submit_move(&descriptor("g1f3")).is_ok());
}

#[test]
fn test_projection_follows_mode() {
    let coordinator = MoveCoordinator::new(online(Color::Black)).unwrap();
    let board = coordinator.project();
    assert_eq!(board.orientation, Color::Black);
    assert_eq!(board.movable_color, Some(Color::Black));

    let local = MoveCoordinator::new(GameMode::Local).unwrap();
    assert_eq!(local.project().destinations.len(), 10);
}

// ============================================================================
// Puzzles
// ============================================================================

const PUZZLE_FEN: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

fn puzzle() -> MoveCoordinator {
    let line = PuzzleLine::parse(PUZZLE_FEN, "g8f6 f3e5 d7d6").unwrap();
    MoveCoordinator::new(GameMode::Puzzle(line)).unwrap()
}

#[test]
fn test_puzzle_wrong_move_is_taken_back() {
    let mut coordinator = puzzle();
    let Some(Outbound::ScriptedReply(setup)) = coordinator.opening_action() else {
        panic!("puzzle should open with its setup move");
    };
    coordinator
        .apply_incoming_move(&setup, MoveOrigin::Script)
        .unwrap();
    let fen = coordinator.timeline().position().fingerprint();

    let submission = coordinator.submit_move(&descriptor("b1c3")).unwrap();
    assert!(matches!(submission.phase, SubmissionPhase::Rejected { .. }));
    assert_eq!(submission.outbound, None);
    assert_eq!(coordinator.timeline().position().fingerprint(), fen);
    assert_eq!(coordinator.puzzle().unwrap().hint(), Some(descriptor("f3e5")));
}

#[test]
fn test_puzzle_solution_schedules_reply_and_completes() {
    let mut coordinator = puzzle();
    coordinator
        .apply_incoming_move(&descriptor("g8f6"), MoveOrigin::Script)
        .unwrap();

    let submission = coordinator.submit_move(&descriptor("f3e5")).unwrap();
    assert!(matches!(submission.phase, SubmissionPhase::Confirmed { .. }));
    assert_eq!(
        submission.outbound,
        Some(Outbound::ScriptedReply(descriptor("d7d6")))
    );

    coordinator
        .apply_incoming_move(&descriptor("d7d6"), MoveOrigin::Script)
        .unwrap();
    assert!(coordinator.puzzle_completed());
    assert_eq!(
        coordinator.submit_move(&descriptor("e5f3")),
        Err(GameError::PuzzleCompleted)
    );
}

#[test]
fn test_puzzle_script_refuses_unexpected_move() {
    let mut coordinator = puzzle();
    assert!(coordinator
        .apply_incoming_move(&descriptor("b8c6"), MoveOrigin::Script)
        .is_err());
    assert_eq!(coordinator.timeline().ply(), 0);
}

// ============================================================================
// Engine Staleness
// ============================================================================

struct SilentWorker;

impl EngineWorker for SilentWorker {
    fn send(&mut self, _command: &UciCommand) -> GameResult<()> {
        Ok(())
    }
}

struct SilentLauncher {
    launched: Arc<Mutex<bool>>,
}

impl WorkerLauncher for SilentLauncher {
    fn probe(&self) -> GameResult<()> {
        Ok(())
    }

    fn launch(&self, _lines: mpsc::UnboundedSender<String>) -> GameResult<Box<dyn EngineWorker>> {
        *self.launched.lock().unwrap() = true;
        Ok(Box::new(SilentWorker))
    }
}

fn engine_game() -> (MoveCoordinator, EngineBridge) {
    let mode = GameMode::Versus {
        player_color: Color::Black,
        difficulty: Difficulty::Beginner,
    };
    let (lines, _) = mpsc::unbounded_channel();
    let launcher = SilentLauncher {
        launched: Arc::new(Mutex::new(false)),
    };
    let bridge = EngineBridge::new(Box::new(launcher), lines, &EngineSettings::default());
    (MoveCoordinator::new(mode).unwrap(), bridge)
}

#[test]
fn test_engine_answer_after_rewrite_still_legal() {
    //! Request at F1, position rewritten, answer is still legal: applied
    let (mut coordinator, mut bridge) = engine_game();
    coordinator.resync("1. e4 e5").unwrap();
    bridge
        .request_move(coordinator.timeline(), Difficulty::Beginner)
        .unwrap();

    coordinator.resync("1. d4 d5").unwrap();
    let outcome = bridge.on_engine_response("bestmove g1f3 ponder g8f6", &mut coordinator);
    assert!(matches!(outcome, EngineOutcome::Applied(_)));
    assert_eq!(coordinator.timeline().played_notation(), "1. d4 d5 2. Nf3");
}

#[test]
fn test_engine_answer_after_rewrite_illegal_is_dropped() {
    //! Request at F1, position rewritten, answer no longer legal: dropped
    let (mut coordinator, mut bridge) = engine_game();
    coordinator.resync("1. e4 e5").unwrap();
    bridge
        .request_move(coordinator.timeline(), Difficulty::Beginner)
        .unwrap();

    coordinator.resync("1. d4 d5").unwrap();
    let outcome = bridge.on_engine_response("bestmove f1c4", &mut coordinator);
    assert!(matches!(
        outcome,
        EngineOutcome::Dropped(GameError::IllegalMove { .. })
    ));
    assert_eq!(coordinator.timeline().played_notation(), "1. d4 d5");
}

#[test]
fn test_engine_no_move_is_dropped() {
    let (mut coordinator, mut bridge) = engine_game();
    bridge
        .request_move(coordinator.timeline(), Difficulty::Beginner)
        .unwrap();
    assert!(matches!(
        bridge.on_engine_response("bestmove (none)", &mut coordinator),
        EngineOutcome::Dropped(GameError::Worker { .. })
    ));
    assert!(!bridge.is_thinking());
}

fn engine_game_after(player_move: &str) -> (MoveCoordinator, EngineBridge) {
    let (_, bridge) = engine_game();
    let mut coordinator = MoveCoordinator::new(GameMode::Versus {
        player_color: Color::White,
        difficulty: Difficulty::Beginner,
    })
    .unwrap();
    let submission = coordinator.submit_move(&descriptor(player_move)).unwrap();
    assert_eq!(submission.outbound, Some(Outbound::EngineRequest));
    (coordinator, bridge)
}

#[test]
fn test_engine_answer_while_browsing_is_applied_after_resync() {
    //! Request, step back, answer: the request's line comes back first
    let (mut coordinator, mut bridge) = engine_game_after("e2e4");
    bridge
        .request_move(coordinator.timeline(), Difficulty::Beginner)
        .unwrap();

    coordinator.step_back();
    assert!(coordinator.timeline().is_browsing());

    let outcome = bridge.on_engine_response("bestmove e7e5", &mut coordinator);
    assert!(matches!(outcome, EngineOutcome::Applied(_)));
    assert!(!coordinator.timeline().is_browsing());
    assert_eq!(coordinator.timeline().played_notation(), "1. e4 e5");
    assert_eq!(coordinator.phase(), SubmissionPhase::Confirmed { ply: 0 });
}

#[test]
fn test_engine_answer_while_browsing_illegal_is_dropped() {
    let (mut coordinator, mut bridge) = engine_game_after("e2e4");
    bridge
        .request_move(coordinator.timeline(), Difficulty::Beginner)
        .unwrap();
    coordinator.step_back();

    // A move for the wrong side in the requesting position
    let outcome = bridge.on_engine_response("bestmove d2d4", &mut coordinator);
    assert!(matches!(
        outcome,
        EngineOutcome::Dropped(GameError::IllegalMove { .. })
    ));
    assert_eq!(coordinator.timeline().played_notation(), "1. e4");
    assert!(!bridge.is_thinking());
    assert!(matches!(
        coordinator.phase(),
        SubmissionPhase::Applying { ply: 0, .. }
    ));
}
