//! Game modes and how each confirms a local move
//!
//! | Mode      | Confirmation   | After a local move               |
//! |-----------|----------------|----------------------------------|
//! | `Local`   | Echo           | nothing, confirmed immediately   |
//! | `Online`  | Push           | submission to the authority      |
//! | `Versus`  | WorkerResponse | engine request                   |
//! | `Puzzle`  | Echo           | scripted reply or completion     |

use chess_oracle::{opponent, Color};

use crate::game::coordinator::puzzle::PuzzleLine;
use crate::game::engine::Difficulty;
use crate::game::record::GameId;

/// Where the verdict on a local move comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The move confirms itself
    Echo,
    /// The authority's next push settles it
    Push,
    /// The engine's answer settles it
    WorkerResponse,
}

/// What kind of game a coordinator runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMode {
    /// Both sides on one board
    Local,
    /// Against a remote opponent through an authority
    Online {
        game_id: GameId,
        player: String,
        color: Color,
    },
    /// Against the engine
    Versus {
        player_color: Color,
        difficulty: Difficulty,
    },
    Puzzle(PuzzleLine),
}

impl GameMode {
    pub fn confirmation(&self) -> Confirmation {
        match self {
            GameMode::Local | GameMode::Puzzle(_) => Confirmation::Echo,
            GameMode::Online { .. } => Confirmation::Push,
            GameMode::Versus { .. } => Confirmation::WorkerResponse,
        }
    }

    /// The side the local user is tied to; `None` for a local board
    pub fn fixed_color(&self) -> Option<Color> {
        match self {
            GameMode::Local => None,
            GameMode::Online { color, .. } => Some(*color),
            GameMode::Versus { player_color, .. } => Some(*player_color),
            GameMode::Puzzle(puzzle) => Some(puzzle.player_color()),
        }
    }

    /// Side played by the engine, in `Versus` mode
    pub fn engine_color(&self) -> Option<Color> {
        match self {
            GameMode::Versus { player_color, .. } => Some(opponent(*player_color)),
            _ => None,
        }
    }

    pub fn game_id(&self) -> Option<GameId> {
        match self {
            GameMode::Online { game_id, .. } => Some(*game_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_per_mode() {
        assert_eq!(GameMode::Local.confirmation(), Confirmation::Echo);
        let online = GameMode::Online {
            game_id: GameId::new(),
            player: "alice".to_string(),
            color: Color::Black,
        };
        assert_eq!(online.confirmation(), Confirmation::Push);
        assert_eq!(online.fixed_color(), Some(Color::Black));

        let versus = GameMode::Versus {
            player_color: Color::White,
            difficulty: Difficulty::Casual,
        };
        assert_eq!(versus.confirmation(), Confirmation::WorkerResponse);
        assert_eq!(versus.engine_color(), Some(Color::Black));
    }
}
