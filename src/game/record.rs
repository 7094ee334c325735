//! Canonical game record
//!
//! The authority's copy of a game. The timeline's played moves must always
//! be reconstructible by replaying `canonical_notation`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use chess_oracle::Color;

/// Identifier of a stored game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who plays which side; a seat may still be open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub white: Option<String>,
    pub black: Option<String>,
}

impl Participants {
    pub fn new(white: impl Into<String>, black: impl Into<String>) -> Self {
        Self {
            white: Some(white.into()),
            black: Some(black.into()),
        }
    }

    /// Side played by `player`, if they take part
    pub fn color_of(&self, player: &str) -> Option<Color> {
        if self.white.as_deref() == Some(player) {
            Some(Color::White)
        } else if self.black.as_deref() == Some(player) {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// A stored game: who plays it and its canonical movetext
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: GameId,
    pub participants: Participants,
    pub canonical_notation: String,
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    /// Fresh record with no moves
    pub fn new(participants: Participants) -> Self {
        Self {
            id: GameId::new(),
            participants,
            canonical_notation: String::new(),
            created_at: Utc::now(),
        }
    }
}
