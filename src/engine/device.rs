//! The engine used when a compute device is available.
//!
//! Single positions gain nothing from the device. They are copied back to the host and handled by
//! the CPU engine, so single-position calls are effectively CPU-bound whichever backend is active.
//! Whole batches go through the native [`kernels`](super::kernels).
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::sync::Arc;
use crate::chess::{Board, BoardBatch, Color, Move, MoveList, PackedMoves, NONE, EMPTY, SQUARE_COUNT};
use crate::device::{Device, DeviceArray};
use super::{Engine, BatchKernels, BatchOp, Evaluation, BatchEvaluation, AttackMaps, BatchAttackMaps};
use super::{cpu, kernels};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A board held in device memory.
#[derive(Debug, Clone)]
pub struct DeviceBoard {
    /// Piece codes
    pub piece: DeviceArray<i8>,
    /// Color codes
    pub color: DeviceArray<i8>,
}

impl DeviceBoard {
    /// Copies the board back into host memory
    pub fn to_host(&self) -> Board {
        let mut board = Board::new([NONE; SQUARE_COUNT], [EMPTY; SQUARE_COUNT]);
        self.piece.copy_to_host(&mut board.piece);
        self.color.copy_to_host(&mut board.color);
        board
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Engine backed by a compute device.
#[derive(Debug, Clone)]
pub struct DeviceEngine {
    device: Arc<Device>,
}

impl DeviceEngine {
    /// Creates an engine running on `device`
    pub fn new(device: Arc<Device>) -> DeviceEngine {
        DeviceEngine { device }
    }

    /// Returns the device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Copies `board` into device memory
    pub fn upload(&self, board: &Board) -> DeviceBoard {
        DeviceBoard {
            piece: self.device.upload(&board.piece[..]),
            color: self.device.upload(&board.color[..]),
        }
    }

    /// Returns white's and black's attack maps as device arrays.
    pub fn compute_attack_maps_resident(&self, board: &DeviceBoard) -> (DeviceArray<bool>, DeviceArray<bool>) {
        let maps = cpu::compute_attack_maps(&board.to_host());
        (self.device.upload(&maps.white[..]), self.device.upload(&maps.black[..]))
    }

    /// Returns `[white_offense, white_defense, black_offense, black_defense]` as a device array.
    pub fn evaluate_resident(&self, board: &DeviceBoard) -> DeviceArray<i32> {
        let eval = cpu::evaluate(&board.to_host());
        self.device.upload(&eval.to_array()[..])
    }

    /// Returns the pseudo-legal moves of `side_to_move` as a device array.
    pub fn generate_moves_resident(&self, board: &DeviceBoard, side_to_move: Color) -> DeviceArray<Move> {
        let moves = cpu::generate_pseudo_legal_moves(&board.to_host(), side_to_move);
        self.device.upload(&moves[..])
    }
}

impl Engine for DeviceEngine {
    fn name(&self) -> &'static str {
        "device"
    }

    fn compute_attack_maps(&self, board: &Board) -> AttackMaps {
        let (white, black) = self.compute_attack_maps_resident(&self.upload(board));
        let mut maps = AttackMaps::new();
        white.copy_to_host(&mut maps.white);
        black.copy_to_host(&mut maps.black);
        maps
    }

    fn evaluate(&self, board: &Board) -> Evaluation {
        let mut scores = [0; 4];
        self.evaluate_resident(&self.upload(board)).copy_to_host(&mut scores);
        Evaluation::from_array(scores)
    }

    fn generate_pseudo_legal_moves(&self, board: &Board, side_to_move: Color) -> MoveList {
        let mut moves = MoveList::new();
        for mv in self.generate_moves_resident(&self.upload(board), side_to_move).into_host() {
            moves.push(mv);
        }
        moves
    }

    fn batch_kernels(&self) -> Option<&dyn BatchKernels> {
        Some(self)
    }
}

impl BatchKernels for DeviceEngine {
    fn supports(&self, op: BatchOp) -> bool {
        match op {
            BatchOp::Evaluate | BatchOp::AttackMaps | BatchOp::GenerateMoves => true,
        }
    }

    fn compute_attack_maps_batch(&self, batch: &BoardBatch) -> BatchAttackMaps {
        kernels::compute_attack_maps_batch(&self.device, batch)
    }

    fn evaluate_batch(&self, batch: &BoardBatch) -> BatchEvaluation {
        kernels::evaluate_batch(&self.device, batch)
    }

    fn generate_moves_batch(&self, batch: &BoardBatch, side_to_move: &[Color]) -> PackedMoves {
        kernels::generate_moves_batch(&self.device, batch, side_to_move)
    }
}

#[cfg(test)]
mod device_engine_tests {
    use super::*;
    use crate::chess::Piece;

    fn engine() -> DeviceEngine {
        DeviceEngine::new(Arc::new(Device::open(2).expect("device")))
    }

    #[test]
    fn resident_board_round_trip() {
        let engine = engine();
        let board = Board::starting_position();
        assert_eq!(engine.upload(&board).to_host(), board);
        assert_eq!(engine.device().workers(), 2);
    }

    #[test]
    fn single_position_calls_match_cpu() {
        let engine = engine();
        let mut board = Board::starting_position();
        board.clear(11).put(27, Color::White, Piece::Pawn).put(36, Color::Black, Piece::Knight);

        assert_eq!(engine.compute_attack_maps(&board), cpu::compute_attack_maps(&board));
        assert_eq!(engine.evaluate(&board), cpu::evaluate(&board));
        for &side in [Color::White, Color::Black].iter() {
            assert_eq!(
                engine.generate_pseudo_legal_moves(&board, side).to_vec(),
                cpu::generate_pseudo_legal_moves(&board, side).to_vec()
            );
        }
    }

    #[test]
    fn exposes_every_batch_kernel() {
        let engine = engine();
        let kernels = engine.batch_kernels().expect("kernels");
        for &op in BatchOp::ALL.iter() {
            assert!(kernels.supports(op));
        }
        assert!(cpu::CpuEngine.batch_kernels().is_none());
    }
}
