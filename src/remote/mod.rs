//! Remote authority contract
//!
//! The authority owns the canonical record of an online game. Clients submit
//! moves and learn the outcome only through change notifications: every
//! accepted move publishes a [`RecordChanged`] with the full canonical
//! notation. Notifications are at-least-once and unordered relative to the
//! acknowledgement of a submission, so the client reconciles on content,
//! never on arrival order.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use chess_oracle::{MoveDescriptor, OracleResult};

use crate::game::record::{GameId, GameRecord};

pub use memory::InMemoryAuthority;

/// Errors returned by an authority when it refuses a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Cannot move pieces of game that has ended")]
    GameEnded,

    #[error("Player {player} is not part of this game")]
    NotParticipant { player: String },

    #[error("It is not {player}'s turn")]
    NotYourTurn { player: String },

    #[error("Illegal move: {descriptor}")]
    IllegalMove { descriptor: String },

    /// Transport or storage failure
    #[error("Authority unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for authority operations
pub type AuthorityResult<T> = Result<T, AuthorityError>;

/// Move as it travels on the wire: `{"from": "e7", "to": "e8", "promotion": "q"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMove {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

impl WireMove {
    /// Read the move back as a descriptor
    pub fn descriptor(&self) -> OracleResult<MoveDescriptor> {
        let promotion = self.promotion.as_deref().unwrap_or("");
        format!("{}{}{}", self.from, self.to, promotion).parse()
    }
}

impl From<MoveDescriptor> for WireMove {
    fn from(descriptor: MoveDescriptor) -> Self {
        Self {
            from: descriptor.from.to_string(),
            to: descriptor.to.to_string(),
            promotion: descriptor.promotion.map(|kind| kind.char().to_string()),
        }
    }
}

/// Payload of a move submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSubmission {
    pub game_id: GameId,
    pub player: String,
    #[serde(rename = "move")]
    pub mv: WireMove,
}

impl MoveSubmission {
    pub fn new(game_id: GameId, player: impl Into<String>, descriptor: MoveDescriptor) -> Self {
        Self {
            game_id,
            player: player.into(),
            mv: descriptor.into(),
        }
    }
}

/// Notification that a record's canonical notation changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChanged {
    pub game_id: GameId,
    pub notation: String,
}

/// Persistence and transport for online games
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Submit a move; `Ok` only means the authority accepted it
    async fn submit_move(&self, submission: MoveSubmission) -> AuthorityResult<()>;

    /// Current record of a game
    async fn fetch(&self, game_id: GameId) -> AuthorityResult<GameRecord>;

    /// Change notifications for every game; filter by `game_id`
    fn subscribe(&self) -> broadcast::Receiver<RecordChanged>;
}
