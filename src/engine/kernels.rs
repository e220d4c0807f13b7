//! Native batch kernels run on the compute device.
//!
//! Evaluation is one reduction per board. Knight, king and pawn attacks launch one worker per
//! (board, square) pair that scatters into shared masks; sliding attacks fall back to a per-board
//! CPU loop. Move generation is a two-phase compaction: every board fills a fixed-capacity region
//! of one scratch buffer, then an exclusive prefix sum over the counts places each board's moves
//! in one dense array.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::convert::TryFrom;
use crate::chess::{Board, BoardBatch, Color, Piece, Move, PackedMoves, NONE, SQUARE_COUNT};
use crate::chess::{MOVE_CAPACITY, MOVE_FIELDS};
use crate::chess::attacks::attacks;
use crate::device::{Device, DeviceMask};
use super::{Evaluation, BatchEvaluation, AttackMaps, BatchAttackMaps, cpu};
use super::eval::{code_val, king_shield_proxy, MOBILITY_PER_PIECE};

/// Piece types whose batch attacks have a native kernel
pub const NATIVE_ATTACKERS: [Piece; 3] = [Piece::Knight, Piece::King, Piece::Pawn];

/// Returns the exclusive prefix sum of `counts` and the grand total.
///
/// # Example
/// ```
/// use bishopforge::engine::kernels::exclusive_scan;
/// assert_eq!(exclusive_scan(&[3, 0, 2]), (vec![0, 3, 3], 5));
/// ```
pub fn exclusive_scan(counts: &[usize]) -> (Vec<usize>, usize) {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut total = 0;
    for &count in counts {
        offsets.push(total);
        total += count;
    }
    (offsets, total)
}

/// Scores one board with the batch heuristics: exact material, a piece-count mobility proxy and a
/// king safety proxy that counts every own pawn.
fn reduce_board(piece: &[i8; SQUARE_COUNT], color: &[i8; SQUARE_COUNT]) -> Evaluation {
    let mut material = [0; Color::COUNT];
    let mut pieces = [0; Color::COUNT];
    let mut pawns = [0; Color::COUNT];
    let mut kings = [false; Color::COUNT];

    for sq in 0..SQUARE_COUNT {
        let side = match Color::try_from(color[sq]) {
            Ok(side) if piece[sq] != NONE => side as usize,
            _ => continue,
        };
        material[side] += code_val(piece[sq]);
        pieces[side] += 1;
        if piece[sq] == Piece::Pawn.code() {
            pawns[side] += 1;
        }
        if piece[sq] == Piece::King.code() {
            kings[side] = true;
        }
    }

    let offense = |side: usize| material[side] + MOBILITY_PER_PIECE * pieces[side];
    let defense = |side: usize| if kings[side] { king_shield_proxy(pawns[side]) } else { 0 };

    Evaluation {
        white_offense: offense(Color::White as usize),
        white_defense: defense(Color::White as usize),
        black_offense: offense(Color::Black as usize),
        black_defense: defense(Color::Black as usize),
    }
}

/// Evaluates every board of `batch`.
pub fn evaluate_batch(device: &Device, batch: &BoardBatch) -> BatchEvaluation {
    let pieces = device.upload(batch.pieces());
    let colors = device.upload(batch.colors());
    let mut scores = device.zeros::<[i32; 4]>(batch.len());

    device.launch_chunks(&mut scores, 1, |board, out| {
        out[0] = reduce_board(&pieces[board], &colors[board]).to_array();
    });

    scores.into_host().into_iter().map(Evaluation::from_array).collect()
}

fn to_rows(flags: Vec<bool>) -> Vec<[bool; SQUARE_COUNT]> {
    flags.chunks(SQUARE_COUNT)
        .map(|chunk| {
            let mut row = [false; SQUARE_COUNT];
            row.copy_from_slice(chunk);
            row
        })
        .collect()
}

/// Computes the attack maps of every board of `batch`.
pub fn compute_attack_maps_batch(device: &Device, batch: &BoardBatch) -> BatchAttackMaps {
    let n = batch.len();
    let pieces = device.upload(batch.pieces());
    let colors = device.upload(batch.colors());
    let masks: [DeviceMask; Color::COUNT] = [
        device.mask(n * SQUARE_COUNT),
        device.mask(n * SQUARE_COUNT),
    ];

    for &kind in NATIVE_ATTACKERS.iter() {
        device.launch(n * SQUARE_COUNT, |gid| {
            let (board, sq) = (gid / SQUARE_COUNT, gid % SQUARE_COUNT);
            if pieces[board][sq] != kind.code() {
                return;
            }
            if let Ok(side) = Color::try_from(colors[board][sq]) {
                let base = board * SQUARE_COUNT;
                for &target in attacks(kind, side, sq as u8, &pieces[board]).iter() {
                    masks[side as usize].set(base + target as usize);
                }
            }
        });
    }

    let mut maps = BatchAttackMaps {
        white: to_rows(masks[Color::White as usize].to_host()),
        black: to_rows(masks[Color::Black as usize].to_host()),
    };

    // TODO: ray casting kernel for bishops, rooks and queens
    for (i, board) in batch.iter().enumerate() {
        let sliders = cpu::slider_attack_maps(&board);
        let mut merged = AttackMaps { white: maps.white[i], black: maps.black[i] };
        merged.merge(&sliders);
        maps.white[i] = merged.white;
        maps.black[i] = merged.black;
    }

    maps
}

/// Generates the pseudo-legal moves of every board of `batch`, each for its own side to move.
///
/// # Panics
///
/// Panics if `side_to_move` does not have one entry per board, or if any board overflows its
/// move region.
pub fn generate_moves_batch(device: &Device, batch: &BoardBatch, side_to_move: &[Color]) -> PackedMoves {
    assert_eq!(side_to_move.len(), batch.len(), "one side to move per board");

    let n = batch.len();
    let pieces = device.upload(batch.pieces());
    let colors = device.upload(batch.colors());
    let sides = device.upload(side_to_move);

    // phase 1: per-board regions of the scratch buffer
    let mut scratch = device.zeros::<Move>(n * MOVE_CAPACITY);
    let mut counts = device.zeros::<usize>(n);
    device.launch_regions(&mut scratch, MOVE_CAPACITY, &mut counts, |board, region| {
        let moves = cpu::generate_pseudo_legal_moves(
            &Board::new(pieces[board], colors[board]),
            sides[board],
        );
        region[..moves.len()].copy_from_slice(&moves[..]);
        moves.len()
    });

    // phase 2: compaction
    let (offsets, total) = exclusive_scan(&counts.to_host());
    let mut rows = device.zeros::<[i32; MOVE_FIELDS]>(total);
    device.launch_segments(&mut rows, &offsets, |board, out| {
        let region = &scratch[board * MOVE_CAPACITY..];
        for (row, mv) in out.iter_mut().zip(region.iter()) {
            *row = mv.to_row(board);
        }
    });

    PackedMoves::from_rows(rows.into_host())
}

#[cfg(test)]
mod kernel_tests {
    use super::*;
    use crate::chess::{MoveFlags, MOVE_IDX};

    fn device() -> Device {
        Device::open(2).expect("device")
    }

    #[test]
    fn scan() {
        assert_eq!(exclusive_scan(&[]), (vec![], 0));
        assert_eq!(exclusive_scan(&[20, 20, 0, 1]), (vec![0, 20, 40, 40], 41));
    }

    #[test]
    fn starting_position_batch_scores() {
        let batch = BoardBatch::repeat(&Board::starting_position(), 2);
        let evals = evaluate_batch(&device(), &batch);
        assert_eq!(evals.len(), 2);
        assert_eq!(evals.get(1), Evaluation::from_array([4160, 180, 4160, 180]));
    }

    #[test]
    fn lone_kings_and_empty_boards() {
        let mut kings = Board::empty();
        kings.put(4, Color::White, Piece::King).put(60, Color::Black, Piece::King);
        let batch = BoardBatch::from_boards(vec![kings, Board::empty()]);
        let evals = evaluate_batch(&device(), &batch);
        assert_eq!(evals.get(0), Evaluation::from_array([10, 100, 10, 100]));
        assert_eq!(evals.get(1), Evaluation::default());
    }

    #[test]
    fn attack_maps_match_cpu() {
        let mut mixed = Board::starting_position();
        mixed.clear(12).clear(51).put(28, Color::White, Piece::Pawn).put(35, Color::Black, Piece::Pawn);
        let boards = vec![Board::starting_position(), Board::empty(), mixed];
        let batch = BoardBatch::from_boards(boards.clone());
        let maps = compute_attack_maps_batch(&device(), &batch);

        assert_eq!(maps.len(), 3);
        for (i, board) in boards.iter().enumerate() {
            assert_eq!(maps.get(i), cpu::compute_attack_maps(board));
        }
    }

    #[test]
    fn moves_are_compacted_in_board_order() {
        let mut pawn = Board::empty();
        pawn.put(52, Color::White, Piece::Pawn);
        let batch = BoardBatch::from_boards(vec![
            Board::starting_position(),
            Board::empty(),
            pawn,
            Board::starting_position(),
        ]);
        let sides = [Color::White, Color::White, Color::White, Color::Black];
        let packed = generate_moves_batch(&device(), &batch, &sides);

        assert_eq!(packed.len(), 44);
        assert_eq!(packed.counts(4), vec![20, 0, 4, 20]);
        let idx: Vec<_> = packed.rows().iter().map(|row| row[MOVE_IDX]).collect();
        let mut sorted = idx.clone();
        sorted.sort();
        assert_eq!(idx, sorted);
        assert!(packed.for_board(2).iter().all(|mv| mv.flags == MoveFlags::NORMAL));

        for (i, board) in batch.iter().enumerate() {
            let single = cpu::generate_pseudo_legal_moves(&board, sides[i]);
            assert_eq!(packed.for_board(i), single.to_vec());
        }
    }

    #[test]
    fn empty_batch() {
        let device = device();
        let batch = BoardBatch::new();
        assert!(evaluate_batch(&device, &batch).is_empty());
        assert!(compute_attack_maps_batch(&device, &batch).is_empty());
        assert!(generate_moves_batch(&device, &batch, &[]).is_empty());
    }
}
