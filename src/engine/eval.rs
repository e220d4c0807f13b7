//! Scoring tables and the per-color score pieces shared by both backends.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use crate::chess::{Board, Color, Piece, NONE, rank_of, file_of, square_at};

/// Material value per piece code, index 0 being the empty square.
pub const PIECE_VAL: [i32; Piece::CODES] = [ 0, 100, 320, 330, 500, 900, 0 ];

/// King safety score of a king with no shield at all
pub const KING_SAFETY_BASE: i32 = 100;

/// King safety added per shielding pawn
pub const SHIELD_PAWN_VAL: i32 = 10;

/// Mobility credited per own piece by the batch proxy
pub const MOBILITY_PER_PIECE: i32 = 10;

/// Returns the material value of a piece.
pub fn piece_val(piece: Piece) -> i32 {
    PIECE_VAL[piece as usize]
}

/// Returns the material value of a raw piece code, 0 for anything out of range.
pub fn code_val(code: i8) -> i32 {
    if code > NONE && (code as usize) < Piece::CODES {
        PIECE_VAL[code as usize]
    } else {
        0
    }
}

/// Pawn-shield king safety for a `color` king on `king_sq`.
///
/// Counts own pawns on the king's file and the two adjacent files, one rank toward `color`'s own
/// back rank. A king already on its back rank has no such rank and scores the base value.
pub fn king_shield(board: &Board, color: Color, king_sq: u8) -> i32 {
    let king_rank = rank_of(king_sq) as i8;
    let king_file = file_of(king_sq) as i8;
    let shield_rank = match color {
        Color::White => king_rank - 1,
        Color::Black => king_rank + 1,
    };

    let mut score = KING_SAFETY_BASE;
    if !(0..8).contains(&shield_rank) {
        return score;
    }

    for file in (king_file - 1)..=(king_file + 1) {
        if !(0..8).contains(&file) {
            continue;
        }
        let sq = square_at(file as u8, shield_rank as u8);
        if board.at(sq) == Some((color, Piece::Pawn)) {
            score += SHIELD_PAWN_VAL;
        }
    }

    score
}

/// Simplified king safety used by batch kernels: every own pawn counts as a shield pawn.
pub fn king_shield_proxy(pawns: i32) -> i32 {
    KING_SAFETY_BASE + SHIELD_PAWN_VAL * pawns
}

/// Forward-push availability for a `color` pawn on `sq`: 1 for a free single push, plus 1 for a
/// free double push from the starting rank.
pub fn pawn_push_mobility(board: &Board, sq: u8, color: Color) -> i32 {
    let one = match color.step(sq) {
        Some(one) if board.is_empty(one) => one,
        _ => return 0,
    };

    if rank_of(sq) == color.pawn_rank() {
        if let Some(two) = color.step(one) {
            if board.is_empty(two) {
                return 2;
            }
        }
    }

    1
}
