//! UCI protocol lines
//!
//! Only the slice of UCI the bridge needs: the commands it sends and the
//! `bestmove` answer it waits for. Everything else an engine prints (`info`,
//! `id`, `uciok`, `readyok`) is classified as [`EngineLine::Other`].

use std::fmt;

use chess_oracle::MoveDescriptor;

/// A command written to the engine's stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: String },
    UciNewGame,
    /// `position fen <fen>`
    PositionFen(String),
    /// `go movetime <ms>`
    GoMovetime(u64),
    Quit,
}

impl UciCommand {
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        UciCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => write!(f, "uci"),
            UciCommand::IsReady => write!(f, "isready"),
            UciCommand::SetOption { name, value } => {
                write!(f, "setoption name {name} value {value}")
            }
            UciCommand::UciNewGame => write!(f, "ucinewgame"),
            UciCommand::PositionFen(fen) => write!(f, "position fen {fen}"),
            UciCommand::GoMovetime(ms) => write!(f, "go movetime {ms}"),
            UciCommand::Quit => write!(f, "quit"),
        }
    }
}

/// What one line of engine output means to the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    /// `bestmove e2e4 [ponder ...]`
    BestMove(MoveDescriptor),
    /// `bestmove 0000` or `bestmove (none)`: no legal move in the position
    NoMove,
    /// A `bestmove` line whose move could not be read
    Malformed(String),
    Other,
}

/// Classify one line of engine output
pub fn classify(line: &str) -> EngineLine {
    let mut words = line.split_whitespace();
    if words.next() != Some("bestmove") {
        return EngineLine::Other;
    }
    match words.next() {
        Some("0000") | Some("(none)") => EngineLine::NoMove,
        Some(token) => match token.parse::<MoveDescriptor>() {
            Ok(descriptor) => EngineLine::BestMove(descriptor),
            Err(_) => EngineLine::Malformed(line.trim().to_string()),
        },
        None => EngineLine::Malformed(line.trim().to_string()),
    }
}
