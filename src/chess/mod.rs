//! The `chess` module defines the flat array representation of positions shared by every
//! compute backend.
//!
//! A board is two parallel 64-element sequences, one piece code and one color code per square,
//! with square index `rank * 8 + file` (rank 0 is rank 1, file 0 is file a).
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::ops;
use std::fmt;
use std::convert::TryFrom;
use error::*;

/// Number of squares on a board
pub const SQUARE_COUNT: usize = 64;

/// Piece code of an empty square
pub const NONE: i8 = 0;

/// Color code of an empty square
pub const EMPTY: i8 = -1;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Which side a piece or player is on, based on the color of the pieces for that side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    /// The number of colors
    pub const COUNT: usize = 2;

    /// Returns the color code stored in a color array
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Returns the rank on which this color's pawns start
    pub fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Returns the rank on which this color's pawns promote
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Returns the square offset of one step "forward" for this color
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 8,
            Color::Black => -8,
        }
    }

    /// Returns the square one step forward from `sq`, or `None` past the last rank
    pub fn step(self, sq: u8) -> Option<u8> {
        let target = sq as i16 + self.forward() as i16;
        if (0..SQUARE_COUNT as i16).contains(&target) {
            Some(target as u8)
        } else {
            None
        }
    }
}

impl ops::Not for Color {
    type Output = Color;

    /// Returns the opposite color
    ///
    /// # Example
    /// ```
    /// use bishopforge::chess::Color;
    /// assert_eq!(!Color::White, Color::Black);
    /// assert_eq!(!Color::Black, Color::White);
    /// ```
    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => "white".fmt(f),
            Color::Black => "black".fmt(f),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::White
    }
}

impl TryFrom<i8> for Color {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            0 => Ok(Color::White),
            1 => Ok(Color::Black),
            _ => Err(Error::InvalidSideToMove { code: value }),
        }
    }
}

impl From<Color> for usize {
    fn from(value: Color) -> Self {
        value as Self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A type of chess piece. Discriminants are the piece codes stored in a piece array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Piece {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl Piece {
    /// The number of piece codes, including `NONE`
    pub const CODES: usize = Piece::King as usize + 1;

    /// The pieces a pawn may promote to, in generation order
    pub const PROMOTIONS: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

    /// Returns the piece code stored in a piece array
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Returns the piece for a code, or `None` for `NONE` and unknown codes
    pub fn from_code(code: i8) -> Option<Piece> {
        match code {
            1 => Some(Piece::Pawn),
            2 => Some(Piece::Knight),
            3 => Some(Piece::Bishop),
            4 => Some(Piece::Rook),
            5 => Some(Piece::Queen),
            6 => Some(Piece::King),
            _ => None,
        }
    }

    /// Returns `true` for bishops, rooks and queens
    pub fn is_sliding(self) -> bool {
        match self {
            Piece::Bishop | Piece::Rook | Piece::Queen => true,
            _ => false,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Piece::Pawn => "P",
            Piece::Knight => "N",
            Piece::Bishop => "B",
            Piece::Rook => "R",
            Piece::Queen => "Q",
            Piece::King => "K",
        }.fmt(f)
    }
}

impl From<Piece> for usize {
    fn from(value: Piece) -> Self {
        value as Self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Returns the rank (0-7) of a square.
pub fn rank_of(sq: u8) -> u8 {
    sq / 8
}

/// Returns the file (0-7) of a square.
pub fn file_of(sq: u8) -> u8 {
    sq % 8
}

/// Returns the square at `file` and `rank`.
pub fn square_at(file: u8, rank: u8) -> u8 {
    rank * 8 + file
}

/// Returns the coordinate name of a square, such as `e4`.
///
/// # Example
/// ```
/// use bishopforge::chess::square_name;
/// assert_eq!(square_name(0), "a1");
/// assert_eq!(square_name(28), "e4");
/// ```
pub fn square_name(sq: u8) -> String {
    let file = (b'a' + file_of(sq)) as char;
    let rank = (b'1' + rank_of(sq)) as char;
    format!("{}{}", file, rank)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// One position: a piece code and a color code per square.
///
/// `piece[sq] == NONE` exactly when `color[sq] == EMPTY`. Nothing in the engine re-validates this.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Piece code per square
    pub piece: [i8; SQUARE_COUNT],
    /// Color code per square
    pub color: [i8; SQUARE_COUNT],
}

impl Board {
    /// Creates a board from raw piece and color arrays
    pub fn new(piece: [i8; SQUARE_COUNT], color: [i8; SQUARE_COUNT]) -> Board {
        Board { piece, color }
    }

    /// Returns a board with no pieces
    pub fn empty() -> Board {
        Board {
            piece: [NONE; SQUARE_COUNT],
            color: [EMPTY; SQUARE_COUNT],
        }
    }

    /// Returns the standard starting arrangement
    pub fn starting_position() -> Board {
        use Piece::*;
        const BACK_RANK: [Piece; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut board = Board::empty();
        for file in 0..8 {
            board.put(square_at(file, 0), Color::White, BACK_RANK[file as usize]);
            board.put(square_at(file, 1), Color::White, Pawn);
            board.put(square_at(file, 6), Color::Black, Pawn);
            board.put(square_at(file, 7), Color::Black, BACK_RANK[file as usize]);
        }
        board
    }

    /// Places a piece on `sq`, replacing anything already there
    pub fn put(&mut self, sq: u8, color: Color, piece: Piece) -> &mut Self {
        self.piece[sq as usize] = piece.code();
        self.color[sq as usize] = color.code();
        self
    }

    /// Empties `sq`
    pub fn clear(&mut self, sq: u8) -> &mut Self {
        self.piece[sq as usize] = NONE;
        self.color[sq as usize] = EMPTY;
        self
    }

    /// Returns the color and type of the piece on `sq`, if any
    pub fn at(&self, sq: u8) -> Option<(Color, Piece)> {
        let piece = Piece::from_code(self.piece[sq as usize])?;
        let color = Color::try_from(self.color[sq as usize]).ok()?;
        Some((color, piece))
    }

    /// Returns `true` if `sq` holds no piece
    pub fn is_empty(&self, sq: u8) -> bool {
        self.piece[sq as usize] == NONE
    }

    /// Returns `true` if `sq` holds a piece of `color`
    pub fn is_color(&self, sq: u8, color: Color) -> bool {
        self.color[sq as usize] == color.code()
    }

    /// Checks that every code is in range. Used by the input normalization layer.
    pub fn validate(&self, index: usize) -> Result<()> {
        for sq in 0..SQUARE_COUNT {
            let piece = self.piece[sq];
            if !(NONE..=Piece::King.code()).contains(&piece) {
                return Err(Error::InvalidPieceCode { board: index, square: sq, code: piece });
            }
            let color = self.color[sq];
            if !(EMPTY..=Color::Black.code()).contains(&color) {
                return Err(Error::InvalidColorCode { board: index, square: sq, code: color });
            }
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl fmt::Debug for Board {
    /// Draws the board rank 8 first, uppercase for white and lowercase for black.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = match self.at(square_at(file, rank)) {
                    Some((Color::White, piece)) => piece.to_string(),
                    Some((Color::Black, piece)) => piece.to_string().to_lowercase(),
                    None => ".".to_owned(),
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A stack of boards sharing one board-index axis: `piece` and `color` are both N x 64.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardBatch {
    piece: Vec<[i8; SQUARE_COUNT]>,
    color: Vec<[i8; SQUARE_COUNT]>,
}

impl BoardBatch {
    /// Creates an empty batch
    pub fn new() -> BoardBatch {
        Default::default()
    }

    /// Creates a batch holding `n` copies of `board`
    pub fn repeat(board: &Board, n: usize) -> BoardBatch {
        BoardBatch {
            piece: vec![board.piece; n],
            color: vec![board.color; n],
        }
    }

    /// Creates a batch from a sequence of boards
    pub fn from_boards<I>(boards: I) -> BoardBatch where I: IntoIterator<Item = Board> {
        let mut batch = BoardBatch::new();
        batch.extend(boards);
        batch
    }

    /// Appends a board to the batch
    pub fn push(&mut self, board: Board) {
        self.piece.push(board.piece);
        self.color.push(board.color);
    }

    /// Returns the number of boards
    pub fn len(&self) -> usize {
        self.piece.len()
    }

    /// Returns `true` if the batch holds no boards
    pub fn is_empty(&self) -> bool {
        self.piece.is_empty()
    }

    /// Returns a copy of board `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn board(&self, index: usize) -> Board {
        Board::new(self.piece[index], self.color[index])
    }

    /// Returns the piece stack
    pub fn pieces(&self) -> &[[i8; SQUARE_COUNT]] {
        &self.piece
    }

    /// Returns the color stack
    pub fn colors(&self) -> &[[i8; SQUARE_COUNT]] {
        &self.color
    }

    /// Iterates over the boards in index order
    pub fn iter(&self) -> impl Iterator<Item = Board> + '_ {
        self.piece.iter().zip(self.color.iter()).map(|(p, c)| Board::new(*p, *c))
    }
}

impl Extend<Board> for BoardBatch {
    fn extend<I: IntoIterator<Item = Board>>(&mut self, iter: I) {
        for board in iter {
            self.push(board);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
pub mod attacks;
pub mod moves;
pub use moves::{Move, MoveFlags, MoveList, PackedMoves, BatchMove};
pub use moves::{MOVE_CAPACITY, MOVE_FIELDS, MOVE_IDX, MOVE_FROM, MOVE_TO, MOVE_PROMO, MOVE_FLAGS};

pub mod error;

#[cfg(test)]
mod color_tests {
    use std::convert::TryFrom;
    use super::Color;

    #[test]
    fn display_trait_works() {
        assert_eq!(format!("{}", Color::White), "white");
        assert_eq!(format!("{}", Color::Black), "black");
    }

    #[test]
    fn default_is_white() {
        assert_eq!(Color::White, Default::default());
    }

    #[test]
    fn codes_are_correct() {
        assert_eq!(Color::White.code(), 0);
        assert_eq!(Color::Black.code(), 1);
        assert_eq!(usize::from(Color::Black), 1);
    }

    #[test]
    fn from_code_is_correct() {
        assert_eq!(Color::try_from(0).unwrap(), Color::White);
        assert_eq!(Color::try_from(1).unwrap(), Color::Black);
        assert!(Color::try_from(-1).is_err());
        assert!(Color::try_from(2).is_err());
    }

    #[test]
    fn pawn_geometry() {
        assert_eq!(Color::White.pawn_rank(), 1);
        assert_eq!(Color::Black.pawn_rank(), 6);
        assert_eq!(Color::White.promotion_rank(), 7);
        assert_eq!(Color::Black.promotion_rank(), 0);
        assert_eq!(Color::White.forward(), -Color::Black.forward());
        assert_eq!(Color::White.step(12), Some(20));
        assert_eq!(Color::Black.step(52), Some(44));
        assert_eq!(Color::White.step(60), None);
        assert_eq!(Color::Black.step(3), None);
    }
}
