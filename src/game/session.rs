//! Game session actor
//!
//! One tokio task owns the [`MoveCoordinator`] and the optional
//! [`EngineBridge`] of a game. Everything that can change the game is turned
//! into a message for that task, so mutations never interleave:
//!
//! - user commands from any number of [`SessionHandle`] clones (mpsc)
//! - record changes pushed by the [`RemoteAuthority`] (broadcast, filtered by
//!   game id)
//! - output lines of the engine worker (mpsc)
//!
//! Each message is handled to completion before the next is taken. After
//! every change a [`SessionEvent`] with the fresh board projection goes out
//! on the event channel.
//!
//! Nothing blocks the loop. Remote submissions run as detached tasks; an
//! accepted move is confirmed later by a push, a refused one comes back in
//! as a command together with the authority's current record. Puzzle
//! replies are scheduled on a timer and come back in as commands.

use std::sync::Arc;
use std::time::Duration;

use chess_oracle::{Move, MoveDescriptor};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::error::{GameError, GameResult};
use crate::core::settings::SessionSettings;
use crate::game::coordinator::{
    GameMode, MoveCoordinator, Outbound, Reconciliation, Submission, SubmissionPhase,
};
use crate::game::engine::{EngineBridge, EngineOutcome, WorkerLauncher};
use crate::game::feedback::{MoveCue, MoveOrigin};
use crate::game::material::MaterialLedger;
use crate::game::projection::BoardDescriptor;
use crate::remote::{MoveSubmission, RecordChanged, RemoteAuthority};

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 64;

/// History navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back,
    Forward,
    Start,
    End,
}

/// What happened in a [`SessionEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
    /// A move reached the board
    Moved {
        mv: Move,
        /// `None` when feedback cues are switched off
        cue: Option<MoveCue>,
        origin: MoveOrigin,
    },
    /// The history cursor moved
    Navigated,
    /// The whole line was replaced (load or divergent push)
    Resynced { last: Option<Move> },
    /// A waiting move was settled without changing the board
    Settled,
    /// A puzzle move that is not the solution; already taken back
    Rejected { mv: Move },
    /// An asynchronous input was discarded
    Dropped(GameError),
    PuzzleCompleted,
}

/// Broadcast after every change to the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub board: BoardDescriptor,
    pub material: MaterialLedger,
    pub phase: SubmissionPhase,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub board: BoardDescriptor,
    pub played_notation: String,
    pub line_notation: String,
    pub phase: SubmissionPhase,
    pub material: MaterialLedger,
    pub browsing: bool,
}

enum SessionCommand {
    Submit {
        descriptor: MoveDescriptor,
        reply: oneshot::Sender<GameResult<Submission>>,
    },
    Navigate(Navigation),
    Load {
        notation: String,
        reply: oneshot::Sender<GameResult<()>>,
    },
    ScriptedReply(MoveDescriptor),
    /// The authority turned down the move at `ply`
    RemoteRefused {
        ply: usize,
        reason: String,
        notation: Option<String>,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Configures and starts a session task
pub struct SessionBuilder {
    coordinator: MoveCoordinator,
    authority: Option<Arc<dyn RemoteAuthority>>,
    launcher: Option<Box<dyn WorkerLauncher>>,
    settings: SessionSettings,
}

impl SessionBuilder {
    pub fn new(coordinator: MoveCoordinator) -> Self {
        Self {
            coordinator,
            authority: None,
            launcher: None,
            settings: SessionSettings::default(),
        }
    }

    /// Authority for online games
    pub fn authority(mut self, authority: Arc<dyn RemoteAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Launcher for the engine worker in games against the computer
    pub fn engine(mut self, launcher: Box<dyn WorkerLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Spawn the session on the current tokio runtime
    pub fn spawn(self) -> (SessionHandle, JoinHandle<()>) {
        let (commands, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        // Subscribe before the task starts so no push is missed
        let changes = self.authority.as_ref().map(|authority| authority.subscribe());
        let bridge = self
            .launcher
            .map(|launcher| EngineBridge::new(launcher, line_tx, &self.settings.engine));

        let session = Session {
            coordinator: self.coordinator,
            bridge,
            authority: self.authority,
            reply_delay: Duration::from_millis(self.settings.puzzle_reply_delay_ms),
            sound_effects: self.settings.sound_effects,
            events: events.clone(),
            commands: commands.downgrade(),
        };
        let task = tokio::spawn(session.run(command_rx, line_rx, changes));

        (SessionHandle { commands, events }, task)
    }
}

/// Cloneable handle for talking to a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Play a local move
    pub async fn submit(&self, descriptor: MoveDescriptor) -> GameResult<Submission> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Submit { descriptor, reply }).await?;
        response.await.map_err(|_| GameError::SessionClosed)?
    }

    pub async fn navigate(&self, navigation: Navigation) -> GameResult<()> {
        self.send(SessionCommand::Navigate(navigation)).await
    }

    /// Replace the game with a notation record
    pub async fn load(&self, notation: impl Into<String>) -> GameResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Load {
            notation: notation.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| GameError::SessionClosed)?
    }

    pub async fn snapshot(&self) -> GameResult<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        response.await.map_err(|_| GameError::SessionClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn shutdown(&self) -> GameResult<()> {
        self.send(SessionCommand::Shutdown).await
    }

    async fn send(&self, command: SessionCommand) -> GameResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| GameError::SessionClosed)
    }
}

struct Session {
    coordinator: MoveCoordinator,
    bridge: Option<EngineBridge>,
    authority: Option<Arc<dyn RemoteAuthority>>,
    reply_delay: Duration,
    sound_effects: bool,
    events: broadcast::Sender<SessionEvent>,
    commands: mpsc::WeakSender<SessionCommand>,
}

impl Session {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut engine_lines: mpsc::UnboundedReceiver<String>,
        mut changes: Option<broadcast::Receiver<RecordChanged>>,
    ) {
        info!("[SESSION] Started ({:?})", self.coordinator.mode().confirmation());
        if let Some(action) = self.coordinator.opening_action() {
            self.dispatch(action);
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(line) = engine_lines.recv() => self.handle_engine_line(&line),
                change = next_change(&mut changes) => self.handle_change(change, &mut changes).await,
            }
        }

        info!("[SESSION] Stopped at ply {}", self.coordinator.timeline().ply());
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Submit { descriptor, reply } => {
                let result = self.submit(&descriptor);
                if reply.send(result).is_err() {
                    debug!("[SESSION] Submitter went away before the reply");
                }
            }
            SessionCommand::Navigate(navigation) => self.navigate(navigation),
            SessionCommand::Load { notation, reply } => {
                let result = self.load(&notation);
                if reply.send(result).is_err() {
                    debug!("[SESSION] Loader went away before the reply");
                }
            }
            SessionCommand::ScriptedReply(descriptor) => self.play_scripted(&descriptor),
            SessionCommand::RemoteRefused {
                ply,
                reason,
                notation,
            } => self.remote_refused(ply, reason, notation),
            SessionCommand::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("[SESSION] Snapshot requester went away");
                }
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn submit(&mut self, descriptor: &MoveDescriptor) -> GameResult<Submission> {
        let submission = self.coordinator.submit_move(descriptor)?;

        if let SubmissionPhase::Rejected { .. } = submission.phase {
            self.emit(SessionEventKind::Rejected {
                mv: submission.mv.clone(),
            });
        } else {
            self.emit_moved(&submission.mv, MoveOrigin::Local);
        }

        match submission.outbound.clone() {
            Some(action) => self.dispatch(action),
            None if self.coordinator.puzzle_completed() => {
                self.emit(SessionEventKind::PuzzleCompleted)
            }
            None => {}
        }
        Ok(submission)
    }

    fn navigate(&mut self, navigation: Navigation) {
        let moved = match navigation {
            Navigation::Back => usize::from(self.coordinator.step_back().is_some()),
            Navigation::Forward => usize::from(self.coordinator.step_forward().is_some()),
            Navigation::Start => self.coordinator.jump_to_start(),
            Navigation::End => self.coordinator.jump_to_end(),
        };
        if moved > 0 {
            self.emit(SessionEventKind::Navigated);
        }
    }

    fn load(&mut self, notation: &str) -> GameResult<()> {
        self.coordinator.resync(notation)?;
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.supersede();
        }
        self.coordinator.release_pending();

        info!("[SESSION] Loaded game at ply {}", self.coordinator.timeline().ply());
        self.emit(SessionEventKind::Resynced {
            last: self.coordinator.timeline().last_move().cloned(),
        });
        if let Some(action) = self.coordinator.opening_action() {
            self.dispatch(action);
        }
        Ok(())
    }

    fn play_scripted(&mut self, descriptor: &MoveDescriptor) {
        match self
            .coordinator
            .apply_incoming_move(descriptor, MoveOrigin::Script)
        {
            Ok(mv) => {
                self.emit_moved(&mv, MoveOrigin::Script);
                if self.coordinator.puzzle_completed() {
                    info!("[SESSION] Puzzle completed");
                    self.emit(SessionEventKind::PuzzleCompleted);
                }
            }
            Err(e) => {
                warn!("[SESSION] Scripted reply {} dropped: {}", descriptor, e);
                self.emit(SessionEventKind::Dropped(e));
            }
        }
    }

    /// Carry out the follow-up of a move
    fn dispatch(&mut self, action: Outbound) {
        match action {
            Outbound::Remote(submission) => self.submit_remote(submission),
            Outbound::EngineRequest => self.request_engine_move(),
            Outbound::ScriptedReply(descriptor) => self.schedule_reply(descriptor),
        }
    }

    fn submit_remote(&self, submission: MoveSubmission) {
        let Some(authority) = self.authority.clone() else {
            error!("[SESSION] Online move {:?} but no authority configured", submission.mv);
            return;
        };
        let SubmissionPhase::Applying { ply, .. } = self.coordinator.phase() else {
            return;
        };
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let game_id = submission.game_id;
            let Err(e) = authority.submit_move(submission).await else {
                debug!("[SESSION] Authority accepted move for game {}", game_id);
                return;
            };
            warn!("[SESSION] Authority refused move for game {}: {}", game_id, e);

            let notation = match authority.fetch(game_id).await {
                Ok(record) => Some(record.canonical_notation),
                Err(fetch_err) => {
                    error!("[SESSION] Fetching game {} failed: {}", game_id, fetch_err);
                    None
                }
            };
            if let Some(commands) = commands.upgrade() {
                let _ = commands
                    .send(SessionCommand::RemoteRefused {
                        ply,
                        reason: e.to_string(),
                        notation,
                    })
                    .await;
            }
        });
    }

    /// Reject a refused move and put the authority's record back on the board
    fn remote_refused(&mut self, ply: usize, reason: String, notation: Option<String>) {
        if !self.coordinator.refuse_pending(ply) {
            debug!("[SESSION] Refusal for ply {} arrived after its verdict", ply);
            return;
        }
        if let Some(notation) = notation {
            self.reconcile(&notation);
        }
        self.emit(SessionEventKind::Dropped(GameError::Refused { reason }));
    }

    fn request_engine_move(&mut self) {
        let GameMode::Versus { difficulty, .. } = *self.coordinator.mode() else {
            return;
        };
        let result = match self.bridge.as_mut() {
            Some(bridge) => bridge.request_move(self.coordinator.timeline(), difficulty),
            None => Err(GameError::UnsupportedEnvironment {
                reason: "no engine configured".to_string(),
            }),
        };
        if let Err(e) = result {
            error!("[SESSION] Engine request failed: {}", e);
            self.coordinator.release_pending();
            self.emit(SessionEventKind::Dropped(e));
        }
    }

    fn schedule_reply(&self, descriptor: MoveDescriptor) {
        let commands = self.commands.clone();
        let delay = self.reply_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The session may be gone by now
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(SessionCommand::ScriptedReply(descriptor)).await;
            }
        });
    }

    fn handle_engine_line(&mut self, line: &str) {
        let Some(bridge) = self.bridge.as_mut() else {
            return;
        };
        let outcome = bridge.on_engine_response(line, &mut self.coordinator);
        let thinking = bridge.is_thinking();

        match outcome {
            EngineOutcome::Ignored => {}
            EngineOutcome::Applied(mv) => self.emit_moved(&mv, MoveOrigin::Engine),
            EngineOutcome::Dropped(e) => {
                if !thinking {
                    self.coordinator.release_pending();
                }
                self.emit(SessionEventKind::Dropped(e));
            }
        }
    }

    async fn handle_change(
        &mut self,
        change: Result<RecordChanged, RecvError>,
        changes: &mut Option<broadcast::Receiver<RecordChanged>>,
    ) {
        let Some(game_id) = self.coordinator.mode().game_id() else {
            return;
        };
        let notation = match change {
            Ok(change) if change.game_id == game_id => change.notation,
            Ok(_) => return,
            Err(RecvError::Lagged(skipped)) => {
                warn!("[SESSION] Missed {} record changes, fetching record", skipped);
                let Some(authority) = self.authority.as_ref() else {
                    return;
                };
                match authority.fetch(game_id).await {
                    Ok(record) => record.canonical_notation,
                    Err(e) => {
                        error!("[SESSION] Fetching game {} failed: {}", game_id, e);
                        return;
                    }
                }
            }
            Err(RecvError::Closed) => {
                warn!("[SESSION] Authority closed its change feed");
                *changes = None;
                return;
            }
        };
        self.reconcile(&notation);
    }

    fn reconcile(&mut self, notation: &str) {
        let before = self.coordinator.phase();
        match self.coordinator.on_remote_update(notation) {
            Ok(Reconciliation::Echo) => {
                if self.coordinator.phase() != before {
                    self.emit(SessionEventKind::Settled);
                }
            }
            Ok(Reconciliation::Extended { appended }) => {
                if let Some(mv) = appended.last() {
                    self.emit_moved(mv, MoveOrigin::Remote);
                }
            }
            Ok(Reconciliation::Resynced { last }) => {
                self.emit(SessionEventKind::Resynced { last });
            }
            Err(e) => {
                warn!("[SESSION] Pushed record ignored: {}", e);
                self.emit(SessionEventKind::Dropped(e));
            }
        }
    }

    fn emit_moved(&self, mv: &Move, origin: MoveOrigin) {
        self.emit(SessionEventKind::Moved {
            mv: mv.clone(),
            cue: self.sound_effects.then(|| MoveCue::for_move(mv)),
            origin,
        });
    }

    fn emit(&self, kind: SessionEventKind) {
        let event = SessionEvent {
            kind,
            board: self.coordinator.project(),
            material: *self.coordinator.timeline().material(),
            phase: self.coordinator.phase(),
        };
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> SessionSnapshot {
        let timeline = self.coordinator.timeline();
        SessionSnapshot {
            board: self.coordinator.project(),
            played_notation: timeline.played_notation(),
            line_notation: timeline.line_notation(),
            phase: self.coordinator.phase(),
            material: *timeline.material(),
            browsing: timeline.is_browsing(),
        }
    }
}

/// Next record change, or never when there is no feed
async fn next_change(
    changes: &mut Option<broadcast::Receiver<RecordChanged>>,
) -> Result<RecordChanged, RecvError> {
    match changes {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::coordinator::PuzzleLine;

    const PUZZLE_FEN: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

    async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event in time")
            .expect("event channel open")
    }

    #[tokio::test]
    async fn test_local_moves_and_navigation() {
        let coordinator = MoveCoordinator::new(GameMode::Local).unwrap();
        let (handle, task) = SessionBuilder::new(coordinator).spawn();
        let mut events = handle.subscribe();

        handle.submit("e2e4".parse().unwrap()).await.unwrap();
        handle.submit("e7e5".parse().unwrap()).await.unwrap();
        handle.navigate(Navigation::Back).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.browsing);
        assert_eq!(snapshot.played_notation, "1. e4");
        assert_eq!(snapshot.line_notation, "1. e4 e5");
        assert!(!snapshot.board.movable);

        let first = next_event(&mut events).await;
        assert!(matches!(
            first.kind,
            SessionEventKind::Moved {
                origin: MoveOrigin::Local,
                cue: Some(MoveCue::Move),
                ..
            }
        ));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert_eq!(handle.snapshot().await, Err(GameError::SessionClosed));
    }

    #[tokio::test]
    async fn test_cues_follow_sound_setting() {
        let coordinator = MoveCoordinator::new(GameMode::Local).unwrap();
        let settings = SessionSettings {
            sound_effects: false,
            ..SessionSettings::default()
        };
        let (handle, _task) = SessionBuilder::new(coordinator).settings(settings).spawn();
        let mut events = handle.subscribe();

        handle.submit("e2e4".parse().unwrap()).await.unwrap();
        assert!(matches!(
            next_event(&mut events).await.kind,
            SessionEventKind::Moved { cue: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_illegal_submit_changes_nothing() {
        let coordinator = MoveCoordinator::new(GameMode::Local).unwrap();
        let (handle, _task) = SessionBuilder::new(coordinator).spawn();

        assert!(matches!(
            handle.submit("e2e5".parse().unwrap()).await,
            Err(GameError::IllegalMove { .. })
        ));
        assert_eq!(handle.snapshot().await.unwrap().played_notation, "");
    }

    #[tokio::test]
    async fn test_load_replaces_game() {
        let coordinator = MoveCoordinator::new(GameMode::Local).unwrap();
        let (handle, _task) = SessionBuilder::new(coordinator).spawn();

        handle.submit("d2d4".parse().unwrap()).await.unwrap();
        handle.load("1. e4 e5 2. Nf3").await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().played_notation, "1. e4 e5 2. Nf3");

        assert!(matches!(
            handle.load("1. e4 e5 2. Ke3").await,
            Err(GameError::Notation { .. })
        ));
        assert_eq!(handle.snapshot().await.unwrap().played_notation, "1. e4 e5 2. Nf3");
    }

    #[tokio::test]
    async fn test_puzzle_plays_setup_and_replies() {
        //! Setup move is scripted, correct answer gets the scripted reply
        let puzzle = PuzzleLine::parse(PUZZLE_FEN, "g8f6 f3e5 d7d6").unwrap();
        let coordinator = MoveCoordinator::new(GameMode::Puzzle(puzzle)).unwrap();
        let settings = SessionSettings {
            puzzle_reply_delay_ms: 5,
            ..SessionSettings::default()
        };
        let (handle, _task) = SessionBuilder::new(coordinator).settings(settings).spawn();
        let mut events = handle.subscribe();

        let setup = next_event(&mut events).await;
        assert!(matches!(
            setup.kind,
            SessionEventKind::Moved {
                origin: MoveOrigin::Script,
                ..
            }
        ));

        let wrong = handle.submit("d2d4".parse().unwrap()).await.unwrap();
        assert!(matches!(wrong.phase, SubmissionPhase::Rejected { .. }));
        assert!(matches!(
            next_event(&mut events).await.kind,
            SessionEventKind::Rejected { .. }
        ));

        let right = handle.submit("f3e5".parse().unwrap()).await.unwrap();
        assert!(matches!(right.phase, SubmissionPhase::Confirmed { .. }));

        let mut completed = false;
        while !completed {
            completed = next_event(&mut events).await.kind == SessionEventKind::PuzzleCompleted;
        }
        assert!(matches!(
            handle.submit("e5f7".parse().unwrap()).await,
            Err(GameError::PuzzleCompleted)
        ));
    }

    #[tokio::test]
    async fn test_versus_without_engine_drops_request() {
        let mode = GameMode::Versus {
            player_color: chess_oracle::Color::White,
            difficulty: crate::game::engine::Difficulty::Beginner,
        };
        let coordinator = MoveCoordinator::new(mode).unwrap();
        let (handle, _task) = SessionBuilder::new(coordinator).spawn();
        let mut events = handle.subscribe();

        handle.submit("e2e4".parse().unwrap()).await.unwrap();
        let mut dropped = None;
        while dropped.is_none() {
            if let SessionEventKind::Dropped(e) = next_event(&mut events).await.kind {
                dropped = Some(e);
            }
        }
        assert!(matches!(dropped, Some(GameError::UnsupportedEnvironment { .. })));
        // The attempt is released so the user can keep playing
        assert_eq!(handle.snapshot().await.unwrap().phase, SubmissionPhase::Idle);
    }
}
