//! Position oracle for the move timeline
//!
//! Wraps a rules engine behind the [`PositionOracle`] contract: apply and
//! validate moves, undo them, report check and game-over state, and read and
//! write movetext notation.
//!
//! ## Module Organization
//!
//! - `types` - squares, pieces, colours, move descriptors, game status
//! - `move_record` - the [`Move`] record produced by every successful apply
//! - `notation` - PGN movetext codec
//! - `oracle` - the [`PositionOracle`] trait
//! - `position` - [`ChessPosition`], the `shakmaty` implementation
//! - `error` - [`OracleError`] and [`OracleResult`]

pub mod error;
pub mod move_record;
pub mod notation;
pub mod oracle;
pub mod position;
pub mod types;

pub use error::{OracleError, OracleResult};
pub use move_record::Move;
pub use notation::{normalize_san, parse_movetext, NotationLine};
pub use oracle::PositionOracle;
pub use position::ChessPosition;
pub use types::{
    kind_index, opponent, Color, GameStatus, MoveDescriptor, MoveFlags, PieceKind, Square,
    PIECE_KINDS,
};
