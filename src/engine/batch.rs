//! Batch dispatch: native kernels when the backend has them, otherwise a per-board loop over the
//! single-position engine.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use log::debug;
use crate::backend::Backend;
use crate::chess::{BoardBatch, Color, PackedMoves};
use super::{BatchOp, BatchEvaluation, BatchAttackMaps};

fn route(backend: &Backend, op: BatchOp, boards: usize) {
    debug!("{} for {} boards on {}", op, boards, backend.name());
}

/// Computes the attack maps of every board.
pub fn compute_attack_maps_batch(backend: &Backend, batch: &BoardBatch) -> BatchAttackMaps {
    route(backend, BatchOp::AttackMaps, batch.len());
    if let Some(kernels) = backend.batch_kernels(BatchOp::AttackMaps) {
        return kernels.compute_attack_maps_batch(batch);
    }

    let engine = backend.engine();
    batch.iter().map(|board| engine.compute_attack_maps(&board)).collect()
}

/// Evaluates every board.
pub fn evaluate_batch(backend: &Backend, batch: &BoardBatch) -> BatchEvaluation {
    route(backend, BatchOp::Evaluate, batch.len());
    if let Some(kernels) = backend.batch_kernels(BatchOp::Evaluate) {
        return kernels.evaluate_batch(batch);
    }

    let engine = backend.engine();
    batch.iter().map(|board| engine.evaluate(&board)).collect()
}

/// Generates the pseudo-legal moves of every board, tagged with the board index. Boards without
/// moves contribute no rows.
///
/// # Panics
///
/// Panics if `side_to_move` does not have one entry per board.
pub fn generate_moves_batch(backend: &Backend, batch: &BoardBatch, side_to_move: &[Color]) -> PackedMoves {
    assert_eq!(side_to_move.len(), batch.len(), "one side to move per board");

    route(backend, BatchOp::GenerateMoves, batch.len());
    if let Some(kernels) = backend.batch_kernels(BatchOp::GenerateMoves) {
        return kernels.generate_moves_batch(batch, side_to_move);
    }

    let engine = backend.engine();
    let mut packed = PackedMoves::new();
    for (i, board) in batch.iter().enumerate() {
        packed.extend_board(i, &engine.generate_pseudo_legal_moves(&board, side_to_move[i]));
    }
    packed
}
