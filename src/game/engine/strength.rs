//! Engine difficulty levels
//!
//! Configures how strong the engine opponent plays. Each level maps to a UCI
//! `Skill Level` option and a fixed think time per move.
//!
//! # Difficulty Levels
//!
//! | Level | Name         | Skill Level | Time/Move |
//! |-------|--------------|-------------|-----------|
//! | 0     | Beginner     | 0           | 0.1s      |
//! | 1     | Casual       | 2           | 0.3s      |
//! | 2     | Intermediate | 4           | 0.7s      |
//! | 3     | Advanced     | 6           | 1.5s      |
//! | 4     | Master       | 8           | 3.0s      |
//!
//! Skill level is always `level * 2`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine strength selected by the player
///
/// # Examples
///
/// ```rust
/// use chess_timeline::game::engine::Difficulty;
///
/// let difficulty = Difficulty::from_level(3);
/// assert_eq!(difficulty, Difficulty::Advanced);
/// assert_eq!(difficulty.skill_level(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Makes obvious mistakes; good for new players
    Beginner,
    Casual,
    /// Default difficulty
    #[default]
    Intermediate,
    Advanced,
    /// Full strength within the think time
    Master,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Casual,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Master,
    ];

    /// Difficulty for a 0-4 level; higher values clamp to [`Difficulty::Master`]
    pub fn from_level(level: u8) -> Self {
        Self::ALL[usize::from(level.min(4))]
    }

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Casual => 1,
            Difficulty::Intermediate => 2,
            Difficulty::Advanced => 3,
            Difficulty::Master => 4,
        }
    }

    /// Value sent as the UCI `Skill Level` option
    pub fn skill_level(self) -> u8 {
        self.level() * 2
    }

    /// How long the engine may think per move
    pub fn think_time(self) -> Duration {
        let millis = match self {
            Difficulty::Beginner => 100,
            Difficulty::Casual => 300,
            Difficulty::Intermediate => 700,
            Difficulty::Advanced => 1500,
            Difficulty::Master => 3000,
        };
        Duration::from_millis(millis)
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Casual => "Casual",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Master => "Master",
        }
    }
}
