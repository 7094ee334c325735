//! Played move record
//!
//! A [`Move`] is only ever produced by a position oracle after it has
//! validated and applied a request, so every instance describes something
//! that really happened on a board. There is deliberately no public
//! constructor.

use crate::types::{Color, MoveDescriptor, MoveFlags, PieceKind, Square};

/// A move that has been validated and applied by the oracle
///
/// # Fields
///
/// - `from`/`to`: origin and destination (castling reports the king's
///   destination, `e1g1`)
/// - `color`/`piece`: who moved what
/// - `captured`: the piece removed from the board, if any
/// - `is_check`/`is_checkmate`: state of the opponent after the move
/// - `san`: standard algebraic notation without check suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
    color: Color,
    piece: PieceKind,
    captured: Option<PieceKind>,
    is_check: bool,
    is_checkmate: bool,
    flags: MoveFlags,
    san: String,
}

impl Move {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        color: Color,
        piece: PieceKind,
        captured: Option<PieceKind>,
        is_check: bool,
        is_checkmate: bool,
        flags: MoveFlags,
        san: String,
    ) -> Self {
        Self {
            from,
            to,
            promotion,
            color,
            piece,
            captured,
            is_check,
            is_checkmate,
            flags,
            san,
        }
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn piece(&self) -> PieceKind {
        self.piece
    }

    pub fn captured(&self) -> Option<PieceKind> {
        self.captured
    }

    pub fn is_check(&self) -> bool {
        self.is_check
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_checkmate
    }

    pub fn flags(&self) -> MoveFlags {
        self.flags
    }

    /// SAN without the `+`/`#` suffix, e.g. `Nf3`, `exd5`, `O-O`, `e8=Q`
    pub fn san(&self) -> &str {
        &self.san
    }

    /// SAN with the check or mate suffix, as written in movetext
    pub fn san_with_suffix(&self) -> String {
        if self.is_checkmate {
            format!("{}#", self.san)
        } else if self.is_check {
            format!("{}+", self.san)
        } else {
            self.san.clone()
        }
    }

    /// The request that reproduces this move from the position before it
    pub fn descriptor(&self) -> MoveDescriptor {
        MoveDescriptor {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    /// Whether this move answers the request `descriptor`
    ///
    /// Only origin, destination and promotion are compared.
    pub fn matches(&self, descriptor: &MoveDescriptor) -> bool {
        self.from == descriptor.from
            && self.to == descriptor.to
            && self.promotion == descriptor.promotion
    }
}
