//! # Chess Position - `shakmaty`-backed Position Oracle
//!
//! [`ChessPosition`] wraps a [`shakmaty::Chess`] board and adds what the
//! timeline needs on top of plain rules: an undo stack, played-move records
//! and notation round-tripping.
//!
//! ## Undo
//!
//! `shakmaty` positions are small copyable values without an unmake
//! operation, so the oracle keeps the position *before* each applied move on
//! a stack. Undo pops that stack; it never recomputes anything.
//!
//! ## Castling coordinates
//!
//! `shakmaty` encodes castling as king-takes-rook. Records and descriptors
//! use the king's destination square instead (`e1g1`), which is what UCI
//! engines and board UIs speak. Requests go through [`UciMove::to_move`],
//! which accepts either form.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, CastlingSide, Chess, EnPassantMode, Move as BoardMove, Position};

use crate::error::{OracleError, OracleResult};
use crate::move_record::Move;
use crate::notation::{format_movetext, normalize_san, parse_movetext, NotationLine};
use crate::oracle::PositionOracle;
use crate::types::{opponent, Color, GameStatus, MoveDescriptor, MoveFlags, PieceKind, Square};

/// A live chess position with undo and notation support
#[derive(Debug, Clone)]
pub struct ChessPosition {
    initial: Chess,
    current: Chess,
    history: Vec<Chess>,
    applied: Vec<Move>,
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::from_start(Chess::default())
    }
}

impl ChessPosition {
    /// Standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary FEN
    pub fn from_fen(fen: &str) -> OracleResult<Self> {
        Ok(Self::from_start(parse_fen(fen)?))
    }

    /// Start from the replay of a notation record
    pub fn from_notation(notation: &str) -> OracleResult<Self> {
        let mut position = Self::new();
        position.load_from_notation(notation)?;
        Ok(position)
    }

    /// Moves applied since the starting position
    pub fn applied(&self) -> &[Move] {
        &self.applied
    }

    fn from_start(start: Chess) -> Self {
        Self {
            initial: start.clone(),
            current: start,
            history: Vec::new(),
            applied: Vec::new(),
        }
    }

    fn play(&mut self, board_move: &BoardMove) -> Option<Move> {
        let san = San::from_move(&self.current, board_move).to_string();
        let mut after = self.current.clone();
        after.play_unchecked(board_move);

        let record = record_move(&self.current, board_move, &after, san)?;
        let before = std::mem::replace(&mut self.current, after);
        self.history.push(before);
        self.applied.push(record.clone());
        Some(record)
    }
}

impl PositionOracle for ChessPosition {
    fn apply(&mut self, descriptor: &MoveDescriptor) -> OracleResult<Move> {
        let illegal = || OracleError::IllegalMove {
            descriptor: descriptor.to_string(),
        };
        let board_move = descriptor
            .to_uci()
            .to_move(&self.current)
            .map_err(|_| illegal())?;
        self.play(&board_move).ok_or_else(illegal)
    }

    fn apply_token(&mut self, token: &str) -> OracleResult<Move> {
        let illegal = || OracleError::IllegalMove {
            descriptor: token.to_string(),
        };
        let san: San = normalize_san(token.trim()).parse().map_err(|_| illegal())?;
        let board_move = san.to_move(&self.current).map_err(|_| illegal())?;
        self.play(&board_move).ok_or_else(illegal)
    }

    fn undo(&mut self) -> Option<Move> {
        let previous = self.history.pop()?;
        self.current = previous;
        self.applied.pop()
    }

    fn load_from_notation(&mut self, notation: &str) -> OracleResult<Vec<Move>> {
        let line = parse_movetext(notation)?;
        let start = match &line.start {
            Some(fen) => parse_fen(fen)?,
            None => Chess::default(),
        };

        let mut replay = ChessPosition::from_start(start);
        for (ply, token) in line.tokens.iter().enumerate() {
            replay.apply_token(token).map_err(|_| {
                OracleError::notation(ply, format!("'{token}' is not legal at this point"))
            })?;
        }

        let moves = replay.applied.clone();
        *self = replay;
        Ok(moves)
    }

    fn parse_notation(&self, notation: &str) -> OracleResult<NotationLine> {
        let line = parse_movetext(notation)?;
        let start = match &line.start {
            Some(fen) => fen_of(&parse_fen(fen)?),
            None => fen_of(&Chess::default()),
        };
        Ok(NotationLine {
            start: Some(start),
            tokens: line.tokens,
        })
    }

    fn notation_of(&self, moves: &[Move]) -> String {
        let mut board = self.initial.clone();
        let mut complete = true;
        for mv in moves {
            match mv.descriptor().to_uci().to_move(&board) {
                Ok(board_move) => board.play_unchecked(&board_move),
                Err(_) => {
                    complete = false;
                    break;
                }
            }
        }
        let result = if complete {
            status_of(&board).result_token()
        } else {
            None
        };

        let initial_fen = fen_of(&self.initial);
        let start = (initial_fen != fen_of(&Chess::default())).then_some(initial_fen);
        let sans: Vec<String> = moves.iter().map(Move::san_with_suffix).collect();

        format_movetext(
            start.as_deref(),
            self.initial.fullmoves().get(),
            self.initial.turn() == Color::White,
            sans.iter().map(String::as_str),
            result,
        )
    }

    fn to_notation(&self) -> String {
        self.notation_of(&self.applied)
    }

    fn legal_destinations(&self, square: Square) -> Vec<Square> {
        let mut destinations: Vec<Square> = self
            .current
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(square))
            .map(standard_to)
            .collect();
        destinations.sort();
        destinations.dedup();
        destinations
    }

    fn status(&self) -> GameStatus {
        status_of(&self.current)
    }

    fn is_check(&self) -> bool {
        self.current.is_check()
    }

    fn turn(&self) -> Color {
        self.current.turn()
    }

    fn fingerprint(&self) -> String {
        fen_of(&self.current)
    }

    fn initial_fingerprint(&self) -> String {
        fen_of(&self.initial)
    }
}

fn parse_fen(fen: &str) -> OracleResult<Chess> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| OracleError::notation(0, format!("invalid FEN '{fen}': {e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| OracleError::notation(0, format!("impossible position '{fen}': {e}")))
}

fn fen_of(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

fn status_of(position: &Chess) -> GameStatus {
    if position.is_checkmate() {
        GameStatus::Checkmate {
            winner: opponent(position.turn()),
        }
    } else if position.is_game_over() {
        GameStatus::Draw
    } else {
        GameStatus::Ongoing
    }
}

/// Destination as UIs and engines write it (king square for castling)
fn standard_to(board_move: &BoardMove) -> Square {
    match UciMove::from_move(board_move, CastlingMode::Standard) {
        UciMove::Normal { to, .. } => to,
        UciMove::Put { to, .. } => to,
        UciMove::Null => board_move.to(),
    }
}

fn record_move(before: &Chess, board_move: &BoardMove, after: &Chess, san: String) -> Option<Move> {
    let from = board_move.from()?;
    let to = standard_to(board_move);
    let side = board_move.castling_side();

    let flags = MoveFlags {
        capture: board_move.is_capture(),
        en_passant: board_move.is_en_passant(),
        castle_kingside: side == Some(CastlingSide::KingSide),
        castle_queenside: side == Some(CastlingSide::QueenSide),
        promotion: board_move.is_promotion(),
        double_push: board_move.role() == PieceKind::Pawn
            && from.file() == to.file()
            && from.distance(to) == 2,
    };

    Some(Move::new(
        from,
        to,
        board_move.promotion(),
        before.turn(),
        board_move.role(),
        board_move.capture(),
        after.is_check(),
        after.is_checkmate(),
        flags,
        san,
    ))
}
