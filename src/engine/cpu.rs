//! The single-position CPU engine, which is the correctness baseline for every other engine.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use crate::chess::{Board, Color, Piece, Move, MoveFlags, MoveList, SQUARE_COUNT, rank_of};
use crate::chess::attacks::{attacks, pawn_attacks};
use super::{Engine, Evaluation, AttackMaps};
use super::eval::{piece_val, king_shield, pawn_push_mobility};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Computes everything on the calling thread, touching only call-local buffers.
#[derive(Debug, Copy, Clone, Default)]
pub struct CpuEngine;

impl CpuEngine {
    /// Creates a CPU engine
    pub fn new() -> CpuEngine {
        CpuEngine
    }
}

impl Engine for CpuEngine {
    fn name(&self) -> &'static str {
        "CPU"
    }

    fn compute_attack_maps(&self, board: &Board) -> AttackMaps {
        compute_attack_maps(board)
    }

    fn evaluate(&self, board: &Board) -> Evaluation {
        evaluate(board)
    }

    fn generate_pseudo_legal_moves(&self, board: &Board, side_to_move: Color) -> MoveList {
        generate_pseudo_legal_moves(board, side_to_move)
    }
}

/// Returns the attack maps of every piece on `board` for which `filter` returns `true`.
pub fn attack_maps_where<F>(board: &Board, filter: F) -> AttackMaps where F: Fn(Piece) -> bool {
    let mut maps = AttackMaps::new();

    for sq in 0..SQUARE_COUNT as u8 {
        if let Some((color, piece)) = board.at(sq) {
            if !filter(piece) {
                continue;
            }
            let map = maps.of_mut(color);
            for &target in attacks(piece, color, sq, &board.piece).iter() {
                map[target as usize] = true;
            }
        }
    }

    maps
}

/// Returns the attack maps of `board`.
pub fn compute_attack_maps(board: &Board) -> AttackMaps {
    attack_maps_where(board, |_| true)
}

/// Returns the attack maps of the bishops, rooks and queens on `board` only.
pub fn slider_attack_maps(board: &Board) -> AttackMaps {
    attack_maps_where(board, Piece::is_sliding)
}

/// Evaluates `board`.
///
/// Offense is material plus mobility, where mobility counts the attack targets of each piece that
/// are not occupied by its own side, and each pawn additionally counts its free forward pushes.
/// Defense is the pawn-shield king safety, or 0 for a side with no king.
pub fn evaluate(board: &Board) -> Evaluation {
    let mut material = [0; Color::COUNT];
    let mut mobility = [0; Color::COUNT];
    let mut kings: [Option<u8>; Color::COUNT] = [None; Color::COUNT];

    for sq in 0..SQUARE_COUNT as u8 {
        if let Some((color, piece)) = board.at(sq) {
            material[color as usize] += piece_val(piece);
            if piece == Piece::King {
                kings[color as usize] = Some(sq);
            }
        }
    }

    for sq in 0..SQUARE_COUNT as u8 {
        if let Some((color, piece)) = board.at(sq) {
            let targets = attacks(piece, color, sq, &board.piece);
            let free = targets.iter().filter(|&&t| !board.is_color(t, color)).count() as i32;
            mobility[color as usize] += free;
            if piece == Piece::Pawn {
                mobility[color as usize] += pawn_push_mobility(board, sq, color);
            }
        }
    }

    let defense = |color: Color| {
        kings[color as usize].map_or(0, |king_sq| king_shield(board, color, king_sq))
    };

    Evaluation {
        white_offense: material[Color::White as usize] + mobility[Color::White as usize],
        white_defense: defense(Color::White),
        black_offense: material[Color::Black as usize] + mobility[Color::Black as usize],
        black_defense: defense(Color::Black),
    }
}

/// Adds a pawn move, expanded into one move per promotion piece if it lands on the last rank.
fn add_pawn_move(moves: &mut MoveList, color: Color, from: u8, to: u8, flags: MoveFlags) {
    if rank_of(to) == color.promotion_rank() {
        for &piece in Piece::PROMOTIONS.iter() {
            moves.push(Move::promotion(from, to, piece, flags));
        }
    } else {
        moves.push(Move::new(from, to, flags));
    }
}

fn add_pawn_moves(board: &Board, color: Color, sq: u8, moves: &mut MoveList) {
    if let Some(one) = color.step(sq) {
        if board.is_empty(one) {
            add_pawn_move(moves, color, sq, one, MoveFlags::NORMAL);

            if rank_of(sq) == color.pawn_rank() {
                if let Some(two) = color.step(one) {
                    if board.is_empty(two) {
                        moves.push(Move::new(sq, two, MoveFlags::DOUBLE_PUSH));
                    }
                }
            }
        }
    }

    for &target in pawn_attacks(sq, color).iter() {
        if board.is_color(target, !color) {
            add_pawn_move(moves, color, sq, target, MoveFlags::CAPTURE);
        }
    }
}

fn add_piece_moves(board: &Board, color: Color, piece: Piece, sq: u8, moves: &mut MoveList) {
    for &target in attacks(piece, color, sq, &board.piece).iter() {
        if board.is_color(target, color) {
            continue;
        }
        let flags = if board.is_color(target, !color) { MoveFlags::CAPTURE } else { MoveFlags::NORMAL };
        moves.push(Move::new(sq, target, flags));
    }
}

/// Generates the pseudo-legal moves of `side_to_move` in square order. Castling and en passant are
/// never generated.
///
/// # Panics
///
/// Panics if the move buffer overflows, which only a malformed board can cause.
pub fn generate_pseudo_legal_moves(board: &Board, side_to_move: Color) -> MoveList {
    let mut moves = MoveList::new();

    for sq in 0..SQUARE_COUNT as u8 {
        match board.at(sq) {
            Some((color, _)) if color != side_to_move => {},
            Some((color, Piece::Pawn)) => add_pawn_moves(board, color, sq, &mut moves),
            Some((color, piece)) => add_piece_moves(board, color, piece, sq, &mut moves),
            None => {},
        }
    }

    moves
}
