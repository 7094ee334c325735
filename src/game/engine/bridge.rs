//! Engine move bridge
//!
//! Owns the engine worker for one session and correlates its answers with
//! the positions that asked for them.
//!
//! # Lifecycle
//!
//! `Uninitialized -> Ready -> AwaitingMove -> Ready`
//!
//! The worker is started lazily on the first request, after a one-time
//! capability probe. A failed probe moves the bridge to `Unsupported` for
//! good: it never retries and every later request fails with
//! [`GameError::UnsupportedEnvironment`].
//!
//! # Correlation
//!
//! UCI answers carry no request id, and the engine answers every `go` in
//! order. The bridge therefore keeps its requests in a FIFO queue and pairs
//! each `bestmove` with the oldest one. Requests made obsolete by a reload
//! are marked superseded, never cancelled, and their answers are dropped
//! when they arrive.
//!
//! An answer for a live request is applied to the current position. If the
//! user was browsing history meanwhile, the timeline is first resynced to the
//! notation the request was made from. An answer that is not legal any more
//! is dropped.

use std::collections::VecDeque;

use chess_oracle::{Move, PositionOracle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::error::{GameError, GameResult};
use crate::core::settings::EngineSettings;
use crate::game::coordinator::MoveCoordinator;
use crate::game::engine::strength::Difficulty;
use crate::game::engine::uci::{classify, EngineLine, UciCommand};
use crate::game::engine::worker::{EngineWorker, WorkerLauncher};
use crate::game::feedback::MoveOrigin;
use crate::game::timeline::MoveTimeline;

/// Where the bridge is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    /// Probe failed; permanent
    Unsupported { reason: String },
    Ready,
    AwaitingMove,
}

/// A request sent to the engine and not answered yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEngineRequest {
    pub request_id: u64,
    /// FEN of the requesting position
    pub fingerprint: String,
    /// Played notation at request time, for resync
    pub notation: String,
    pub superseded: bool,
}

/// What became of one line of engine output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// Not a move answer
    Ignored,
    Applied(Move),
    Dropped(GameError),
}

/// Owner of the engine worker and its in-flight requests
pub struct EngineBridge {
    launcher: Box<dyn WorkerLauncher>,
    worker: Option<Box<dyn EngineWorker>>,
    lines: mpsc::UnboundedSender<String>,
    settings: EngineSettings,
    state: BridgeState,
    in_flight: VecDeque<PendingEngineRequest>,
    next_request_id: u64,
    skill: Option<u8>,
}

impl EngineBridge {
    /// Bridge whose worker will deliver its output lines to `lines`
    pub fn new(
        launcher: Box<dyn WorkerLauncher>,
        lines: mpsc::UnboundedSender<String>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            launcher,
            worker: None,
            lines,
            settings: settings.clone(),
            state: BridgeState::Uninitialized,
            in_flight: VecDeque::new(),
            next_request_id: 1,
            skill: None,
        }
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Whether a live (not superseded) request is outstanding
    pub fn is_thinking(&self) -> bool {
        self.in_flight.iter().any(|request| !request.superseded)
    }

    /// Probe the host and start the worker, once
    pub fn initialize(&mut self) -> GameResult<()> {
        match &self.state {
            BridgeState::Unsupported { reason } => {
                return Err(GameError::UnsupportedEnvironment {
                    reason: reason.clone(),
                });
            }
            BridgeState::Uninitialized => {}
            BridgeState::Ready | BridgeState::AwaitingMove => return Ok(()),
        }

        if let Err(e) = self.launcher.probe() {
            let reason = match e {
                GameError::UnsupportedEnvironment { reason } => reason,
                other => other.to_string(),
            };
            warn!("[ENGINE] Engine unavailable on this host: {}", reason);
            self.state = BridgeState::Unsupported {
                reason: reason.clone(),
            };
            return Err(GameError::UnsupportedEnvironment { reason });
        }

        let mut worker = self.launcher.launch(self.lines.clone())?;
        worker.send(&UciCommand::Uci)?;
        worker.send(&UciCommand::set_option("Threads", self.settings.threads))?;
        worker.send(&UciCommand::set_option("Hash", self.settings.hash_mb))?;
        worker.send(&UciCommand::IsReady)?;

        self.worker = Some(worker);
        self.state = BridgeState::Ready;
        info!("[ENGINE] Engine ready");
        Ok(())
    }

    /// Ask the engine to move in the timeline's current position
    ///
    /// Only allowed while no live request is outstanding; returns the
    /// request id.
    pub fn request_move<P: PositionOracle>(
        &mut self,
        timeline: &MoveTimeline<P>,
        difficulty: Difficulty,
    ) -> GameResult<u64> {
        self.initialize()?;
        if self.state == BridgeState::AwaitingMove {
            warn!("[ENGINE] Request refused: engine still thinking");
            return Err(GameError::Busy);
        }

        let fingerprint = timeline.position().fingerprint();
        let skill = difficulty.skill_level();

        let mut commands = Vec::with_capacity(4);
        if self.skill != Some(skill) {
            commands.push(UciCommand::set_option("Skill Level", skill));
        }
        commands.push(UciCommand::UciNewGame);
        commands.push(UciCommand::PositionFen(fingerprint.clone()));
        commands.push(UciCommand::GoMovetime(difficulty.think_time().as_millis() as u64));
        self.send_all(&commands)?;
        self.skill = Some(skill);

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight.push_back(PendingEngineRequest {
            request_id,
            fingerprint,
            notation: timeline.played_notation(),
            superseded: false,
        });
        self.state = BridgeState::AwaitingMove;

        info!(
            "[ENGINE] Request #{} | Difficulty: {} | Think Time: {:?}",
            request_id,
            difficulty.name(),
            difficulty.think_time()
        );
        Ok(request_id)
    }

    /// Handle one line of engine output
    pub fn on_engine_response<P: PositionOracle>(
        &mut self,
        raw: &str,
        coordinator: &mut MoveCoordinator<P>,
    ) -> EngineOutcome {
        let line = classify(raw);
        if line == EngineLine::Other {
            debug!("[ENGINE] < {}", raw);
            return EngineOutcome::Ignored;
        }

        let Some(request) = self.in_flight.pop_front() else {
            warn!("[ENGINE] Answer with no request in flight: {}", raw);
            return EngineOutcome::Dropped(GameError::StaleEngineResponse {
                response: raw.trim().to_string(),
            });
        };
        if matches!(self.state, BridgeState::AwaitingMove) && !self.is_thinking() {
            self.state = BridgeState::Ready;
        }

        if request.superseded {
            info!("[ENGINE] Dropping answer to superseded request #{}", request.request_id);
            return EngineOutcome::Dropped(GameError::StaleEngineResponse {
                response: raw.trim().to_string(),
            });
        }

        let descriptor = match line {
            EngineLine::BestMove(descriptor) => descriptor,
            EngineLine::NoMove => {
                warn!("[ENGINE] Engine found no move for request #{}", request.request_id);
                return EngineOutcome::Dropped(GameError::Worker {
                    message: "engine returned no move".to_string(),
                });
            }
            EngineLine::Malformed(text) => {
                error!("[ENGINE] Unreadable answer: {}", text);
                return EngineOutcome::Dropped(GameError::Worker {
                    message: format!("unreadable engine answer '{text}'"),
                });
            }
            EngineLine::Other => return EngineOutcome::Ignored,
        };

        if coordinator.timeline().is_browsing() {
            if let Err(e) = coordinator.resync(&request.notation) {
                error!("[ENGINE] Resync for request #{} failed: {}", request.request_id, e);
                return EngineOutcome::Dropped(e);
            }
        } else if coordinator.timeline().position().fingerprint() != request.fingerprint {
            debug!(
                "[ENGINE] Position changed since request #{}, validating against current",
                request.request_id
            );
        }

        match coordinator.apply_incoming_move(&descriptor, MoveOrigin::Engine) {
            Ok(mv) => {
                info!("[ENGINE] Played {} for request #{}", mv.san_with_suffix(), request.request_id);
                EngineOutcome::Applied(mv)
            }
            Err(e) => {
                warn!("[ENGINE] Dropping {} for request #{}: {}", descriptor, request.request_id, e);
                EngineOutcome::Dropped(e)
            }
        }
    }

    /// Mark every outstanding request obsolete (game reloaded)
    pub fn supersede(&mut self) {
        for request in self.in_flight.iter_mut().filter(|r| !r.superseded) {
            request.superseded = true;
            info!("[ENGINE] Request #{} superseded", request.request_id);
        }
        if self.state == BridgeState::AwaitingMove {
            self.state = BridgeState::Ready;
        }
    }

    fn send_all(&mut self, commands: &[UciCommand]) -> GameResult<()> {
        let worker = self.worker.as_mut().ok_or_else(|| GameError::Worker {
            message: "engine not started".to_string(),
        })?;
        for command in commands {
            worker.send(command)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::coordinator::GameMode;
    use chess_oracle::Color;
    use std::sync::{Arc, Mutex};

    /// Records every command the bridge sends
    struct RecordingWorker {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl EngineWorker for RecordingWorker {
        fn send(&mut self, command: &UciCommand) -> GameResult<()> {
            self.sent.lock().unwrap().push(command.to_string());
            Ok(())
        }
    }

    struct FakeLauncher {
        supported: bool,
        sent: Arc<Mutex<Vec<String>>>,
        launches: Arc<Mutex<usize>>,
    }

    impl WorkerLauncher for FakeLauncher {
        fn probe(&self) -> GameResult<()> {
            if self.supported {
                Ok(())
            } else {
                Err(GameError::UnsupportedEnvironment {
                    reason: "no engine".to_string(),
                })
            }
        }

        fn launch(&self, _lines: mpsc::UnboundedSender<String>) -> GameResult<Box<dyn EngineWorker>> {
            *self.launches.lock().unwrap() += 1;
            Ok(Box::new(RecordingWorker {
                sent: self.sent.clone(),
            }))
        }
    }

    fn bridge(supported: bool) -> (EngineBridge, Arc<Mutex<Vec<String>>>, Arc<Mutex<usize>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let launches = Arc::new(Mutex::new(0));
        let launcher = FakeLauncher {
            supported,
            sent: sent.clone(),
            launches: launches.clone(),
        };
        let (lines, _) = mpsc::unbounded_channel();
        let bridge = EngineBridge::new(Box::new(launcher), lines, &EngineSettings::default());
        (bridge, sent, launches)
    }

    fn versus() -> MoveCoordinator {
        MoveCoordinator::new(GameMode::Versus {
            player_color: Color::White,
            difficulty: Difficulty::Casual,
        })
        .unwrap()
    }

    #[test]
    fn test_request_sends_uci_sequence() {
        //! Handshake once, skill option only when it changes
        let (mut bridge, sent, launches) = bridge(true);
        let mut coordinator = versus();
        coordinator.submit_move(&"e2e4".parse().unwrap()).unwrap();

        bridge.request_move(coordinator.timeline(), Difficulty::Casual).unwrap();
        assert_eq!(bridge.state(), &BridgeState::AwaitingMove);
        let fen = coordinator.timeline().position().fingerprint();
        assert_eq!(
            *sent.lock().unwrap(),
            vec![
                "uci".to_string(),
                "setoption name Threads value 1".to_string(),
                "setoption name Hash value 16".to_string(),
                "isready".to_string(),
                "setoption name Skill Level value 2".to_string(),
                "ucinewgame".to_string(),
                format!("position fen {fen}"),
                "go movetime 300".to_string(),
            ]
        );

        let outcome = bridge.on_engine_response("bestmove e7e5", &mut coordinator);
        assert!(matches!(outcome, EngineOutcome::Applied(_)));
        assert_eq!(bridge.state(), &BridgeState::Ready);

        coordinator.submit_move(&"g1f3".parse().unwrap()).unwrap();
        sent.lock().unwrap().clear();
        bridge.request_move(coordinator.timeline(), Difficulty::Casual).unwrap();
        assert_eq!(sent.lock().unwrap()[0], "ucinewgame");
        assert_eq!(*launches.lock().unwrap(), 1);
    }

    #[test]
    fn test_failed_probe_is_permanent() {
        let (mut bridge, _, launches) = bridge(false);
        let coordinator = versus();

        for _ in 0..2 {
            assert!(matches!(
                bridge.request_move(coordinator.timeline(), Difficulty::Casual),
                Err(GameError::UnsupportedEnvironment { .. })
            ));
        }
        assert!(matches!(bridge.state(), BridgeState::Unsupported { .. }));
        assert_eq!(*launches.lock().unwrap(), 0);
    }

    #[test]
    fn test_second_request_while_thinking_is_busy() {
        let (mut bridge, _, _) = bridge(true);
        let coordinator = versus();
        let mut black = MoveCoordinator::from_notation(
            GameMode::Versus {
                player_color: Color::White,
                difficulty: Difficulty::Casual,
            },
            "1. e4",
        )
        .unwrap();
        bridge.request_move(black.timeline(), Difficulty::Casual).unwrap();
        assert_eq!(
            bridge.request_move(coordinator.timeline(), Difficulty::Casual),
            Err(GameError::Busy)
        );
        assert!(matches!(
            bridge.on_engine_response("bestmove e7e5", &mut black),
            EngineOutcome::Applied(_)
        ));
    }

    #[test]
    fn test_info_lines_are_ignored() {
        let (mut bridge, _, _) = bridge(true);
        let mut coordinator = versus();
        assert_eq!(
            bridge.on_engine_response("info depth 3 score cp 20", &mut coordinator),
            EngineOutcome::Ignored
        );
    }

    #[test]
    fn test_unreadable_answer_is_dropped() {
        let (mut bridge, _, _) = bridge(true);
        let mut coordinator = versus();
        coordinator.submit_move(&"e2e4".parse().unwrap()).unwrap();
        bridge.request_move(coordinator.timeline(), Difficulty::Casual).unwrap();

        assert!(matches!(
            bridge.on_engine_response("bestmove e7", &mut coordinator),
            EngineOutcome::Dropped(GameError::Worker { .. })
        ));
        assert!(!bridge.is_thinking());
        assert_eq!(coordinator.timeline().played_notation(), "1. e4");
    }

    #[test]
    fn test_uncorrelated_answer_is_stale() {
        let (mut bridge, _, _) = bridge(true);
        let mut coordinator = versus();
        assert!(matches!(
            bridge.on_engine_response("bestmove e7e5", &mut coordinator),
            EngineOutcome::Dropped(GameError::StaleEngineResponse { .. })
        ));
    }

    #[test]
    fn test_superseded_answer_is_dropped() {
        //! After a reload the old answer is ignored, the new one applied
        let (mut bridge, _, _) = bridge(true);
        let mut coordinator = versus();
        coordinator.submit_move(&"e2e4".parse().unwrap()).unwrap();
        bridge.request_move(coordinator.timeline(), Difficulty::Casual).unwrap();

        bridge.supersede();
        coordinator.resync("1. d4").unwrap();
        coordinator.release_pending();
        bridge.request_move(coordinator.timeline(), Difficulty::Casual).unwrap();

        assert!(matches!(
            bridge.on_engine_response("bestmove e7e5", &mut coordinator),
            EngineOutcome::Dropped(GameError::StaleEngineResponse { .. })
        ));
        assert_eq!(bridge.state(), &BridgeState::AwaitingMove);
        assert!(matches!(
            bridge.on_engine_response("bestmove d7d5", &mut coordinator),
            EngineOutcome::Applied(_)
        ));
        assert_eq!(coordinator.timeline().played_notation(), "1. d4 d5");
    }

    #[test]
    fn test_browsing_resyncs_before_applying() {
        let (mut bridge, _, _) = bridge(true);
        let mut coordinator = versus();
        coordinator.submit_move(&"e2e4".parse().unwrap()).unwrap();
        bridge.request_move(coordinator.timeline(), Difficulty::Casual).unwrap();

        coordinator.jump_to_start();
        let outcome = bridge.on_engine_response("bestmove c7c5", &mut coordinator);
        assert!(matches!(outcome, EngineOutcome::Applied(_)));
        assert!(!coordinator.timeline().is_browsing());
        assert_eq!(coordinator.timeline().played_notation(), "1. e4 c5");
    }
}
