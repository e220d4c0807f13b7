//! Provides the per-square attack-target functions used by every kernel
//!
//! All geometry is done on square indices. Raw index arithmetic can jump across a board edge
//! (h1 + 1 is a2), so every step checks that the rank and file deltas are the ones the move
//! shape expects.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::ops;
use super::*;

/// Largest number of targets any single piece can have (a centralized queen attacks 27).
pub const MAX_TARGETS: usize = 28;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An ordered list of target squares, stored inline.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Targets {
    squares: [u8; MAX_TARGETS],
    len: u8,
}

impl Targets {
    /// Creates an empty list
    pub fn new() -> Targets {
        Targets { squares: [0; MAX_TARGETS], len: 0 }
    }

    fn push(&mut self, sq: u8) {
        self.squares[self.len as usize] = sq;
        self.len += 1;
    }

    fn append(&mut self, other: &Targets) {
        for &sq in other.iter() {
            self.push(sq);
        }
    }

    /// Returns `true` if `sq` is in the list
    pub fn contains(&self, sq: u8) -> bool {
        self.iter().any(|&t| t == sq)
    }
}

impl Default for Targets {
    fn default() -> Self {
        Targets::new()
    }
}

impl ops::Deref for Targets {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.squares[..self.len as usize]
    }
}

impl fmt::Debug for Targets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|&sq| square_name(sq))).finish()
    }
}

impl<'a> IntoIterator for &'a Targets {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// One of the eight ray directions, named from white's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Direction {
    SouthWest,
    South,
    SouthEast,
    West,
    East,
    NorthWest,
    North,
    NorthEast,
}

use Direction::*;

impl Direction {
    /// Diagonal directions
    pub const DIAGONAL: [Direction; 4] = [SouthWest, SouthEast, NorthWest, NorthEast];
    /// Orthogonal directions
    pub const ORTHOGONAL: [Direction; 4] = [South, West, East, North];
    /// All eight directions
    pub const ALL: [Direction; 8] = [
        SouthWest, South, SouthEast, West, East, NorthWest, North, NorthEast,
    ];

    /// Square-index offset of one step
    pub fn offset(self) -> i8 {
        match self {
            SouthWest => -9,
            South => -8,
            SouthEast => -7,
            West => -1,
            East => 1,
            NorthWest => 7,
            North => 8,
            NorthEast => 9,
        }
    }

    /// File change of one step: -1, 0 or 1
    pub fn file_step(self) -> i8 {
        match self {
            SouthWest | West | NorthWest => -1,
            South | North => 0,
            SouthEast | East | NorthEast => 1,
        }
    }
}

fn offset_square(sq: u8, offset: i8) -> Option<u8> {
    let target = sq as i16 + offset as i16;
    if (0..SQUARE_COUNT as i16).contains(&target) {
        Some(target as u8)
    } else {
        None
    }
}

fn abs_diff(a: u8, b: u8) -> u8 {
    if a > b { a - b } else { b - a }
}

const KNIGHT_OFFSETS: [i8; 8] = [-17, -15, -10, -6, 6, 10, 15, 17];
const KING_OFFSETS: [i8; 8] = [-9, -8, -7, -1, 1, 7, 8, 9];

/// Returns the squares a knight on `sq` attacks.
pub fn knight_attacks(sq: u8) -> Targets {
    let mut targets = Targets::new();

    for &offset in KNIGHT_OFFSETS.iter() {
        if let Some(t) = offset_square(sq, offset) {
            let ranks = abs_diff(rank_of(t), rank_of(sq));
            let files = abs_diff(file_of(t), file_of(sq));
            if (ranks == 2 && files == 1) || (ranks == 1 && files == 2) {
                targets.push(t);
            }
        }
    }

    targets
}

/// Returns the squares a king on `sq` attacks.
pub fn king_attacks(sq: u8) -> Targets {
    let mut targets = Targets::new();

    for &offset in KING_OFFSETS.iter() {
        if let Some(t) = offset_square(sq, offset) {
            if abs_diff(file_of(t), file_of(sq)) <= 1 && abs_diff(rank_of(t), rank_of(sq)) <= 1 {
                targets.push(t);
            }
        }
    }

    targets
}

/// Returns the two diagonal capture squares of a `color` pawn on `sq`. Pushes are not attacks.
pub fn pawn_attacks(sq: u8, color: Color) -> Targets {
    let mut targets = Targets::new();
    let (left, right) = match color {
        Color::White => (NorthWest, NorthEast),
        Color::Black => (SouthWest, SouthEast),
    };

    if file_of(sq) > 0 {
        if let Some(t) = offset_square(sq, left.offset()) {
            targets.push(t);
        }
    }
    if file_of(sq) < 7 {
        if let Some(t) = offset_square(sq, right.offset()) {
            targets.push(t);
        }
    }

    targets
}

/// Walks from `sq` in `direction` until the edge of the board or the first occupied square, which
/// is included so that captures are representable.
pub fn ray_attacks(sq: u8, direction: Direction, piece: &[i8; SQUARE_COUNT]) -> Targets {
    let mut targets = Targets::new();
    let mut current = sq;

    while let Some(next) = offset_square(current, direction.offset()) {
        // a step whose file change disagrees with the direction wrapped around an edge
        if file_of(next) as i8 - file_of(current) as i8 != direction.file_step() {
            break;
        }
        targets.push(next);
        if piece[next as usize] != NONE {
            break;
        }
        current = next;
    }

    targets
}

fn rays(sq: u8, directions: &[Direction], piece: &[i8; SQUARE_COUNT]) -> Targets {
    let mut targets = Targets::new();
    for &direction in directions {
        targets.append(&ray_attacks(sq, direction, piece));
    }
    targets
}

/// Returns the squares a bishop on `sq` attacks given the occupancy in `piece`.
pub fn bishop_attacks(sq: u8, piece: &[i8; SQUARE_COUNT]) -> Targets {
    rays(sq, &Direction::DIAGONAL, piece)
}

/// Returns the squares a rook on `sq` attacks given the occupancy in `piece`.
pub fn rook_attacks(sq: u8, piece: &[i8; SQUARE_COUNT]) -> Targets {
    rays(sq, &Direction::ORTHOGONAL, piece)
}

/// Returns the squares a queen on `sq` attacks given the occupancy in `piece`.
pub fn queen_attacks(sq: u8, piece: &[i8; SQUARE_COUNT]) -> Targets {
    rays(sq, &Direction::ALL, piece)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
type AttackFn = fn(u8, Color, &[i8; SQUARE_COUNT]) -> Targets;

fn no_attacks(_: u8, _: Color, _: &[i8; SQUARE_COUNT]) -> Targets {
    Targets::new()
}

fn pawn_entry(sq: u8, color: Color, _: &[i8; SQUARE_COUNT]) -> Targets {
    pawn_attacks(sq, color)
}

fn knight_entry(sq: u8, _: Color, _: &[i8; SQUARE_COUNT]) -> Targets {
    knight_attacks(sq)
}

fn bishop_entry(sq: u8, _: Color, piece: &[i8; SQUARE_COUNT]) -> Targets {
    bishop_attacks(sq, piece)
}

fn rook_entry(sq: u8, _: Color, piece: &[i8; SQUARE_COUNT]) -> Targets {
    rook_attacks(sq, piece)
}

fn queen_entry(sq: u8, _: Color, piece: &[i8; SQUARE_COUNT]) -> Targets {
    queen_attacks(sq, piece)
}

fn king_entry(sq: u8, _: Color, _: &[i8; SQUARE_COUNT]) -> Targets {
    king_attacks(sq)
}

/// Attack generator per piece code; index 0 is the empty square.
const ATTACK_TABLE: [AttackFn; Piece::CODES] = [
    no_attacks,
    pawn_entry,
    knight_entry,
    bishop_entry,
    rook_entry,
    queen_entry,
    king_entry,
];

/// Returns the squares attacked by a `color` `piece` standing on `sq`.
pub fn attacks(piece: Piece, color: Color, sq: u8, occupancy: &[i8; SQUARE_COUNT]) -> Targets {
    ATTACK_TABLE[piece as usize](sq, color, occupancy)
}
