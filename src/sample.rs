//! Random positions reached by playing random pseudo-legal moves from the starting position.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use crate::chess::{Board, BoardBatch, Color, Move, Piece};
use crate::engine::cpu::generate_pseudo_legal_moves;

/// Returns the board after `mv`. Whatever stood on the destination is replaced.
pub fn apply_move(board: &Board, mv: &Move) -> Board {
    let mut next = *board;
    if let Some((color, piece)) = board.at(mv.from_sq) {
        let piece = mv.promotion_piece().unwrap_or(piece);
        next.clear(mv.from_sq).put(mv.to_sq, color, piece);
    }
    next
}

/// Plays up to `plies` random moves from the starting position, stopping early if the side to
/// move has none. Returns the board and the side to move.
pub fn random_board<R: Rng>(rng: &mut R, plies: usize) -> (Board, Color) {
    let mut board = Board::starting_position();
    let mut side = Color::White;

    for _ in 0..plies {
        let moves = generate_pseudo_legal_moves(&board, side);
        let mv = match moves.choose(rng) {
            Some(mv) => *mv,
            None => break,
        };
        board = apply_move(&board, &mv);
        side = !side;
    }

    (board, side)
}

/// Returns `n` random boards and their sides to move, the same for the same `seed`.
pub fn random_batch(seed: u64, n: usize, plies: usize) -> (BoardBatch, Vec<Color>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut batch = BoardBatch::new();
    let mut sides = Vec::with_capacity(n);

    for _ in 0..n {
        let (board, side) = random_board(&mut rng, plies);
        batch.push(board);
        sides.push(side);
    }

    (batch, sides)
}

/// Returns a board with `count` random pieces on distinct squares, without regard for chess
/// rules other than keeping pawns off the first and last ranks.
pub fn scattered_board<R: Rng>(rng: &mut R, count: usize) -> Board {
    const KINDS: [Piece; 6] = [
        Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King,
    ];

    let mut board = Board::empty();
    let mut squares: Vec<u8> = (0..64).collect();
    squares.shuffle(rng);

    for &sq in squares.iter().take(count.min(64)) {
        let mut piece = *KINDS.choose(rng).unwrap_or(&Piece::Knight);
        if piece == Piece::Pawn && (sq < 8 || sq >= 56) {
            piece = Piece::Knight;
        }
        let color = if rng.gen_range(0, 2) == 0 { Color::White } else { Color::Black };
        board.put(sq, color, piece);
    }

    board
}
