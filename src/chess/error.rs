//! Defines the error types needed by the chess module
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Contract violations detected while normalizing caller-supplied arrays. These are always reported
/// before any computation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A one-dimensional board array whose length is not 64
    BoardLength {
        /// Length that was supplied
        len: usize,
    },
    /// A two-dimensional board stack whose square axis is not 64
    SquareAxis {
        /// Shape that was supplied
        shape: Vec<usize>,
    },
    /// A board array with more than two dimensions
    BoardRank {
        /// Shape that was supplied
        shape: Vec<usize>,
    },
    /// Piece and color arrays with different shapes
    ShapeMismatch {
        /// Shape of the piece array
        piece: Vec<usize>,
        /// Shape of the color array
        color: Vec<usize>,
    },
    /// An array whose data length does not match its declared shape
    DataLength {
        /// Element count implied by the shape
        expected: usize,
        /// Element count actually supplied
        got: usize,
    },
    /// Rows of different lengths in a nested board stack
    RaggedRows,
    /// A side-to-move sequence whose length differs from the number of boards
    SideToMoveLength {
        /// Number of boards
        expected: usize,
        /// Number of side-to-move entries
        got: usize,
    },
    /// A side-to-move array that is neither a scalar nor one-dimensional
    SideToMoveRank {
        /// Shape that was supplied
        shape: Vec<usize>,
    },
    /// A side-to-move code other than 0 (white) or 1 (black)
    InvalidSideToMove {
        /// Offending code
        code: i8,
    },
    /// A piece code outside `NONE..=KING`
    InvalidPieceCode {
        /// Board index
        board: usize,
        /// Square index
        square: usize,
        /// Offending code
        code: i8,
    },
    /// A color code outside `EMPTY..=BLACK`
    InvalidColorCode {
        /// Board index
        board: usize,
        /// Square index
        square: usize,
        /// Offending code
        code: i8,
    },
    /// More than one board passed to a single-position call
    NotSingleBoard {
        /// Number of boards supplied
        boards: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match self {
            BoardLength { len } =>
                write!(f, "expected board array of length 64, got {}", len),
            SquareAxis { shape } =>
                write!(f, "expected boards of shape (N, 64), got {:?}", shape),
            BoardRank { shape } =>
                write!(f, "board arrays must have one or two dimensions, got {:?}", shape),
            ShapeMismatch { piece, color } =>
                write!(f, "piece and color shapes must match, got {:?} vs {:?}", piece, color),
            DataLength { expected, got } =>
                write!(f, "shape implies {} elements, got {}", expected, got),
            RaggedRows =>
                "board rows have different lengths".fmt(f),
            SideToMoveLength { expected, got } =>
                write!(f, "side-to-move length must be {}, got {}", expected, got),
            SideToMoveRank { shape } =>
                write!(f, "side to move must be a scalar or one-dimensional, got {:?}", shape),
            InvalidSideToMove { code } =>
                write!(f, "side to move must be 0 or 1, got {}", code),
            InvalidPieceCode { board, square, code } =>
                write!(f, "board {}, square {}: invalid piece code {}", board, square, code),
            InvalidColorCode { board, square, code } =>
                write!(f, "board {}, square {}: invalid color code {}", board, square, code),
            NotSingleBoard { boards } =>
                write!(f, "expected a single board, got {}", boards),
        }
    }
}

impl std::error::Error for Error { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Result type used by methods in the `chess` module
pub type Result<T> = std::result::Result<T, Error>;
