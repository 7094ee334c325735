//! In-process authority
//!
//! Keeps records in a map and validates submissions the way the hosted move
//! function does: the game must exist and still be running, the player must
//! take part and be on move, and the move must be legal. Accepted moves
//! rewrite the canonical notation and are published to every subscriber.
//!
//! Used by the CLI and by tests; nothing here touches the network.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use chess_oracle::{ChessPosition, PositionOracle};

use crate::game::record::{GameId, GameRecord, Participants};
use crate::remote::{
    AuthorityError, AuthorityResult, MoveSubmission, RecordChanged, RemoteAuthority,
};

const CHANGE_CAPACITY: usize = 64;

/// Authority backed by an in-memory map
pub struct InMemoryAuthority {
    games: Mutex<HashMap<GameId, GameRecord>>,
    changes: broadcast::Sender<RecordChanged>,
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthority {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            games: Mutex::new(HashMap::new()),
            changes,
        }
    }

    /// Create a fresh game between two players
    pub async fn create_game(&self, white: &str, black: &str) -> GameRecord {
        let record = GameRecord::new(Participants::new(white, black));
        info!("[AUTHORITY] Created game {} ({} vs {})", record.id, white, black);
        self.games.lock().await.insert(record.id, record.clone());
        record
    }

    /// Overwrite a record's notation and publish it
    ///
    /// Stands in for an administrative correction or a rollback on the
    /// authority side; no validation beyond a replay check.
    pub async fn replace_notation(&self, game_id: GameId, notation: &str) -> AuthorityResult<()> {
        ChessPosition::from_notation(notation)
            .map_err(|e| AuthorityError::Unavailable(format!("refusing corrupt notation: {e}")))?;
        let mut games = self.games.lock().await;
        let record = games
            .get_mut(&game_id)
            .ok_or(AuthorityError::GameNotFound(game_id))?;
        record.canonical_notation = notation.to_string();
        self.publish(record);
        Ok(())
    }

    /// Re-send the current notation of a game (duplicate delivery)
    pub async fn republish(&self, game_id: GameId) -> AuthorityResult<()> {
        let games = self.games.lock().await;
        let record = games.get(&game_id).ok_or(AuthorityError::GameNotFound(game_id))?;
        self.publish(record);
        Ok(())
    }

    fn publish(&self, record: &GameRecord) {
        let change = RecordChanged {
            game_id: record.id,
            notation: record.canonical_notation.clone(),
        };
        if self.changes.send(change).is_err() {
            // No subscribers yet
            info!("[AUTHORITY] No subscribers for game {}", record.id);
        }
    }
}

#[async_trait]
impl RemoteAuthority for InMemoryAuthority {
    async fn submit_move(&self, submission: MoveSubmission) -> AuthorityResult<()> {
        let mut games = self.games.lock().await;
        let record = games
            .get_mut(&submission.game_id)
            .ok_or(AuthorityError::GameNotFound(submission.game_id))?;

        let mut position = ChessPosition::from_notation(&record.canonical_notation)
            .map_err(|e| AuthorityError::Unavailable(format!("stored record unreadable: {e}")))?;

        if position.is_game_over() {
            return Err(AuthorityError::GameEnded);
        }

        let color = record
            .participants
            .color_of(&submission.player)
            .ok_or_else(|| AuthorityError::NotParticipant {
                player: submission.player.clone(),
            })?;

        if position.turn() != color {
            return Err(AuthorityError::NotYourTurn {
                player: submission.player.clone(),
            });
        }

        let illegal = || AuthorityError::IllegalMove {
            descriptor: format!("{}{}", submission.mv.from, submission.mv.to),
        };
        let descriptor = submission.mv.descriptor().map_err(|_| illegal())?;
        let mv = position.apply(&descriptor).map_err(|e| {
            warn!("[AUTHORITY] Rejected {} in game {}: {}", descriptor, submission.game_id, e);
            illegal()
        })?;

        record.canonical_notation = position.to_notation();
        info!(
            "[AUTHORITY] Game {}: {} played {}",
            submission.game_id,
            submission.player,
            mv.san_with_suffix()
        );
        self.publish(record);
        Ok(())
    }

    async fn fetch(&self, game_id: GameId) -> AuthorityResult<GameRecord> {
        self.games
            .lock()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(AuthorityError::GameNotFound(game_id))
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChanged> {
        self.changes.subscribe()
    }
}
