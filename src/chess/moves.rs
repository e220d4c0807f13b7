//! Contains structures to represent generated moves
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::ops;
use super::*;

/// Capacity of a single board's move buffer. No reachable position comes close.
pub const MOVE_CAPACITY: usize = 256;

/// Number of columns in a packed batch move row
pub const MOVE_FIELDS: usize = 5;
/// Column holding the board index
pub const MOVE_IDX: usize = 0;
/// Column holding the origin square
pub const MOVE_FROM: usize = 1;
/// Column holding the destination square
pub const MOVE_TO: usize = 2;
/// Column holding the promotion piece code, or 0
pub const MOVE_PROMO: usize = 3;
/// Column holding the move flags
pub const MOVE_FLAGS: usize = 4;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Bit-field describing a move.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags(u8);

impl MoveFlags {
    /// A quiet move
    pub const NORMAL: MoveFlags = MoveFlags(0);
    /// The destination holds an opponent's piece
    pub const CAPTURE: MoveFlags = MoveFlags(1);
    /// Reserved; en passant is never generated
    pub const EN_PASSANT: MoveFlags = MoveFlags(2);
    /// Reserved; castling is never generated
    pub const CASTLING: MoveFlags = MoveFlags(4);
    /// A two-square pawn advance
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(8);

    /// Creates flags from their raw bits
    pub fn from_bits(bits: u8) -> MoveFlags {
        MoveFlags(bits)
    }

    /// Returns the raw bits
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit in `other` is set
    pub fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ops::BitOr for MoveFlags {
    type Output = MoveFlags;

    fn bitor(self, rhs: MoveFlags) -> MoveFlags {
        MoveFlags(self.0 | rhs.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A pseudo-legal move on a single board.
///
/// The move might leave the mover's king in check; legality filtering happens elsewhere.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Move {
    /// Origin square
    pub from_sq: u8,
    /// Destination square
    pub to_sq: u8,
    /// Promotion piece code, or 0 if the move is not a promotion
    pub promo: u8,
    /// Move flags
    pub flags: MoveFlags,
}

impl Move {
    /// Creates a non-promotion move
    pub fn new(from_sq: u8, to_sq: u8, flags: MoveFlags) -> Move {
        Move { from_sq, to_sq, promo: 0, flags }
    }

    /// Creates a promotion to `piece`
    pub fn promotion(from_sq: u8, to_sq: u8, piece: Piece, flags: MoveFlags) -> Move {
        Move { from_sq, to_sq, promo: piece.code() as u8, flags }
    }

    /// Returns the promotion piece, if any
    pub fn promotion_piece(&self) -> Option<Piece> {
        Piece::from_code(self.promo as i8)
    }

    /// Returns `true` if the move captures
    pub fn is_capture(&self) -> bool {
        self.flags.contains(MoveFlags::CAPTURE)
    }

    /// Returns the packed row for this move on board `board_idx`
    pub fn to_row(&self, board_idx: usize) -> [i32; MOVE_FIELDS] {
        [
            board_idx as i32,
            self.from_sq as i32,
            self.to_sq as i32,
            self.promo as i32,
            self.flags.bits() as i32,
        ]
    }
}

impl fmt::Display for Move {
    /// Coordinate notation, e.g. `e2e4` or `a7a8q`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = square_name(self.from_sq) + &square_name(self.to_sq);
        if let Some(piece) = self.promotion_piece() {
            s += &piece.to_string().to_lowercase();
        }
        s.fmt(f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A fixed-capacity buffer of moves for one board.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MOVE_CAPACITY],
    len: usize,
}

impl MoveList {
    /// Creates an empty list
    pub fn new() -> MoveList {
        MoveList { moves: [Move::default(); MOVE_CAPACITY], len: 0 }
    }

    /// Appends a move.
    ///
    /// # Panics
    ///
    /// Panics if the list is full. That means the board is malformed or the geometry is broken,
    /// neither of which a caller can recover from.
    pub fn push(&mut self, mv: Move) {
        assert!(
            self.len < MOVE_CAPACITY,
            "move buffer overflow: more than {} moves generated for one board",
            MOVE_CAPACITY
        );
        self.moves[self.len] = mv;
        self.len += 1;
    }

    /// Returns the moves as a vector
    pub fn to_vec(&self) -> Vec<Move> {
        self[..].to_vec()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::new()
    }
}

impl ops::Deref for MoveList {
    type Target = [Move];

    fn deref(&self) -> &[Move] {
        &self.moves[..self.len]
    }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A move tagged with the index of the board it belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BatchMove {
    /// Index of the board within its batch
    pub board_idx: usize,
    /// The move itself
    pub mv: Move,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// All moves of a batch, packed densely as `[board_idx, from_sq, to_sq, promo, flags]` rows with
/// rows of the same board contiguous and boards in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedMoves {
    rows: Vec<[i32; MOVE_FIELDS]>,
}

impl PackedMoves {
    /// Creates an empty move array
    pub fn new() -> PackedMoves {
        Default::default()
    }

    /// Wraps already packed rows
    pub fn from_rows(rows: Vec<[i32; MOVE_FIELDS]>) -> PackedMoves {
        PackedMoves { rows }
    }

    /// Appends every move of board `board_idx`
    pub fn extend_board(&mut self, board_idx: usize, moves: &[Move]) {
        self.rows.extend(moves.iter().map(|mv| mv.to_row(board_idx)));
    }

    /// Returns the `(M, 5)` rows
    pub fn rows(&self) -> &[[i32; MOVE_FIELDS]] {
        &self.rows
    }

    /// Returns the total number of moves
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no board produced a move
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the moves in row order
    pub fn iter(&self) -> impl Iterator<Item = BatchMove> + '_ {
        self.rows.iter().map(|row| BatchMove {
            board_idx: row[MOVE_IDX] as usize,
            mv: Move {
                from_sq: row[MOVE_FROM] as u8,
                to_sq: row[MOVE_TO] as u8,
                promo: row[MOVE_PROMO] as u8,
                flags: MoveFlags::from_bits(row[MOVE_FLAGS] as u8),
            },
        })
    }

    /// Returns the moves of one board, recovered from the board-index column
    pub fn for_board(&self, board_idx: usize) -> Vec<Move> {
        self.iter()
            .filter(|bm| bm.board_idx == board_idx)
            .map(|bm| bm.mv)
            .collect()
    }

    /// Returns the number of moves each of `boards` boards produced
    pub fn counts(&self, boards: usize) -> Vec<usize> {
        let mut counts = vec![0; boards];
        for row in &self.rows {
            counts[row[MOVE_IDX] as usize] += 1;
        }
        counts
    }
}
