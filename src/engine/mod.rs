//! The position engines: attack maps, evaluation and pseudo-legal move generation.
//!
//! Every engine implements [`Engine`] for single positions. Engines that can also process whole
//! batches natively expose a [`BatchKernels`] implementation, and report per operation whether
//! they support it. The [`batch`] module picks between the native kernels and a per-board loop.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::iter::FromIterator;
use crate::chess::{Board, BoardBatch, Color, MoveList, PackedMoves, SQUARE_COUNT};

pub mod eval;
pub mod cpu;
pub mod device;
pub mod kernels;
pub mod batch;

pub use cpu::CpuEngine;
pub use device::{DeviceEngine, DeviceBoard};

/// Largest accepted difference between device and CPU offense scores
pub const OFFENSE_TOLERANCE: i32 = 200;

/// Largest accepted difference between device and CPU defense scores
pub const DEFENSE_TOLERANCE: i32 = 80;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Single-position computations. Implementations must be deterministic and free of shared mutable
/// state so they can be called from many threads at once.
pub trait Engine: fmt::Debug + Send + Sync {
    /// Short name of the engine, used in log messages
    fn name(&self) -> &'static str;

    /// Returns, per color, every square at least one piece of that color could move to or capture
    /// on.
    fn compute_attack_maps(&self, board: &Board) -> AttackMaps;

    /// Returns material plus mobility (offense) and king safety (defense) for both colors.
    fn evaluate(&self, board: &Board) -> Evaluation;

    /// Returns the pseudo-legal moves of `side_to_move`.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MOVE_CAPACITY`](crate::chess::MOVE_CAPACITY) moves are generated.
    fn generate_pseudo_legal_moves(&self, board: &Board, side_to_move: Color) -> MoveList;

    /// Returns the native batch kernels of this engine, if it has any.
    fn batch_kernels(&self) -> Option<&dyn BatchKernels> {
        None
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A batch operation, used to query an engine's native capabilities.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BatchOp {
    Evaluate,
    AttackMaps,
    GenerateMoves,
}

impl BatchOp {
    /// Every batch operation
    pub const ALL: [BatchOp; 3] = [BatchOp::Evaluate, BatchOp::AttackMaps, BatchOp::GenerateMoves];
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::Evaluate => "evaluate",
            BatchOp::AttackMaps => "attack maps",
            BatchOp::GenerateMoves => "move generation",
        }.fmt(f)
    }
}

/// Whole-batch versions of the [`Engine`] operations. Only operations for which
/// [`supports`](BatchKernels::supports) returns `true` may be called.
pub trait BatchKernels: Send + Sync {
    /// Returns `true` if `op` has a native implementation
    fn supports(&self, op: BatchOp) -> bool;

    /// Batch version of [`Engine::compute_attack_maps`]
    fn compute_attack_maps_batch(&self, batch: &BoardBatch) -> BatchAttackMaps;

    /// Batch version of [`Engine::evaluate`]. May differ from the single-position scores within
    /// [`OFFENSE_TOLERANCE`] and [`DEFENSE_TOLERANCE`].
    fn evaluate_batch(&self, batch: &BoardBatch) -> BatchEvaluation;

    /// Batch version of [`Engine::generate_pseudo_legal_moves`]; `side_to_move` has one entry
    /// per board.
    fn generate_moves_batch(&self, batch: &BoardBatch, side_to_move: &[Color]) -> PackedMoves;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The four scores of one position. Offense and defense are kept apart so callers can weight them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub struct Evaluation {
    pub white_offense: i32,
    pub white_defense: i32,
    pub black_offense: i32,
    pub black_defense: i32,
}

impl Evaluation {
    /// Creates an evaluation from `[white_offense, white_defense, black_offense, black_defense]`
    pub fn from_array(scores: [i32; 4]) -> Evaluation {
        Evaluation {
            white_offense: scores[0],
            white_defense: scores[1],
            black_offense: scores[2],
            black_defense: scores[3],
        }
    }

    /// Returns `[white_offense, white_defense, black_offense, black_defense]`
    pub fn to_array(self) -> [i32; 4] {
        [self.white_offense, self.white_defense, self.black_offense, self.black_defense]
    }

    /// Returns the offense score of `color`
    pub fn offense(&self, color: Color) -> i32 {
        match color {
            Color::White => self.white_offense,
            Color::Black => self.black_offense,
        }
    }

    /// Returns the defense score of `color`
    pub fn defense(&self, color: Color) -> i32 {
        match color {
            Color::White => self.white_defense,
            Color::Black => self.black_defense,
        }
    }

    /// Returns `true` if `other` is within the documented device tolerances of `self`
    pub fn within_tolerance(&self, other: &Evaluation) -> bool {
        [Color::White, Color::Black].iter().all(|&color| {
            (self.offense(color) - other.offense(color)).abs() <= OFFENSE_TOLERANCE
                && (self.defense(color) - other.defense(color)).abs() <= DEFENSE_TOLERANCE
        })
    }
}

/// Evaluations of a batch, one `(N,)` column per score.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct BatchEvaluation {
    pub white_offense: Vec<i32>,
    pub white_defense: Vec<i32>,
    pub black_offense: Vec<i32>,
    pub black_defense: Vec<i32>,
}

impl BatchEvaluation {
    /// Returns the number of boards
    pub fn len(&self) -> usize {
        self.white_offense.len()
    }

    /// Returns `true` for an empty batch
    pub fn is_empty(&self) -> bool {
        self.white_offense.is_empty()
    }

    /// Returns the scores of board `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> Evaluation {
        Evaluation {
            white_offense: self.white_offense[index],
            white_defense: self.white_defense[index],
            black_offense: self.black_offense[index],
            black_defense: self.black_defense[index],
        }
    }

    /// Iterates over the boards' scores in index order
    pub fn iter(&self) -> impl Iterator<Item = Evaluation> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

impl FromIterator<Evaluation> for BatchEvaluation {
    fn from_iter<I: IntoIterator<Item = Evaluation>>(iter: I) -> Self {
        let mut batch = BatchEvaluation::default();
        for eval in iter {
            batch.white_offense.push(eval.white_offense);
            batch.white_defense.push(eval.white_defense);
            batch.black_offense.push(eval.black_offense);
            batch.black_defense.push(eval.black_defense);
        }
        batch
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Squares attacked by each color on one board.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttackMaps {
    /// Squares attacked by white
    pub white: [bool; SQUARE_COUNT],
    /// Squares attacked by black
    pub black: [bool; SQUARE_COUNT],
}

impl AttackMaps {
    /// Returns maps with no attacked squares
    pub fn new() -> AttackMaps {
        AttackMaps { white: [false; SQUARE_COUNT], black: [false; SQUARE_COUNT] }
    }

    /// Returns the map of `color`
    pub fn of(&self, color: Color) -> &[bool; SQUARE_COUNT] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Returns the map of `color` for writing
    pub fn of_mut(&mut self, color: Color) -> &mut [bool; SQUARE_COUNT] {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Returns `true` if `color` attacks `sq`
    pub fn attacks(&self, color: Color, sq: u8) -> bool {
        self.of(color)[sq as usize]
    }

    /// Returns the number of squares `color` attacks
    pub fn count(&self, color: Color) -> usize {
        self.of(color).iter().filter(|&&a| a).count()
    }

    /// Marks every square attacked in `other` as attacked here too
    pub fn merge(&mut self, other: &AttackMaps) {
        for sq in 0..SQUARE_COUNT {
            self.white[sq] |= other.white[sq];
            self.black[sq] |= other.black[sq];
        }
    }
}

impl Default for AttackMaps {
    fn default() -> Self {
        AttackMaps::new()
    }
}

impl fmt::Debug for AttackMaps {
    /// Draws both maps side by side, rank 8 first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for rank in (0..8).rev() {
            for map in [&self.white, &self.black].iter() {
                for file in 0..8 {
                    write!(f, "{}", if map[rank * 8 + file] { 'x' } else { '.' })?;
                }
                write!(f, " ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Attack maps of a batch, each color stacked as `(N, 64)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchAttackMaps {
    /// White's maps, one per board
    pub white: Vec<[bool; SQUARE_COUNT]>,
    /// Black's maps, one per board
    pub black: Vec<[bool; SQUARE_COUNT]>,
}

impl BatchAttackMaps {
    /// Returns the number of boards
    pub fn len(&self) -> usize {
        self.white.len()
    }

    /// Returns `true` for an empty batch
    pub fn is_empty(&self) -> bool {
        self.white.is_empty()
    }

    /// Returns the maps of board `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> AttackMaps {
        AttackMaps { white: self.white[index], black: self.black[index] }
    }

    /// Iterates over the boards' maps in index order
    pub fn iter(&self) -> impl Iterator<Item = AttackMaps> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

impl FromIterator<AttackMaps> for BatchAttackMaps {
    fn from_iter<I: IntoIterator<Item = AttackMaps>>(iter: I) -> Self {
        let mut batch = BatchAttackMaps::default();
        for maps in iter {
            batch.white.push(maps.white);
            batch.black.push(maps.black);
        }
        batch
    }
}
