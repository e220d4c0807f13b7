//! The public entry points, which accept loosely shaped caller arrays.
//!
//! Boards are given as a piece array and a color array of the same shape: either `(64,)` for one
//! board or `(N, 64)` for a batch. Side to move is a scalar broadcast to every board or an `(N,)`
//! array. Every contract violation is reported before anything is computed. Results are always
//! host memory, whichever backend ran the computation.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::convert::TryFrom;
use crate::backend::Backend;
use crate::chess::{Board, BoardBatch, Color, Move, SQUARE_COUNT};
use crate::chess::error::{Error, Result};
use crate::engine::batch as dispatch;

pub use crate::chess::{PackedMoves, BatchMove};
pub use crate::engine::{Evaluation, BatchEvaluation, AttackMaps, BatchAttackMaps};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A caller-supplied array of small integer codes with a shape, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostArray {
    data: Vec<i8>,
    shape: Vec<usize>,
}

impl HostArray {
    /// Creates an array, checking that `data` has as many elements as `shape` implies.
    pub fn new(data: Vec<i8>, shape: Vec<usize>) -> Result<HostArray> {
        let expected = shape.iter().product();
        if data.len() != expected {
            return Err(Error::DataLength { expected, got: data.len() });
        }
        Ok(HostArray { data, shape })
    }

    /// Creates a zero-dimensional array
    pub fn scalar(value: i8) -> HostArray {
        HostArray { data: vec![value], shape: Vec::new() }
    }

    /// Creates a two-dimensional array from rows, which must all have the same length. No rows
    /// gives an empty board stack, shaped `(0, 64)`.
    pub fn from_rows<R: AsRef<[i8]>>(rows: &[R]) -> Result<HostArray> {
        let width = rows.first().map_or(SQUARE_COUNT, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::RaggedRows);
            }
            data.extend_from_slice(row);
        }
        Ok(HostArray { data, shape: vec![rows.len(), width] })
    }

    /// Returns the shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the elements in row-major order
    pub fn data(&self) -> &[i8] {
        &self.data
    }
}

impl From<Vec<i8>> for HostArray {
    fn from(data: Vec<i8>) -> Self {
        let shape = vec![data.len()];
        HostArray { data, shape }
    }
}

impl From<&[i8]> for HostArray {
    fn from(data: &[i8]) -> Self {
        HostArray::from(data.to_vec())
    }
}

impl From<[i8; SQUARE_COUNT]> for HostArray {
    fn from(data: [i8; SQUARE_COUNT]) -> Self {
        HostArray::from(data.to_vec())
    }
}

impl From<Vec<[i8; SQUARE_COUNT]>> for HostArray {
    fn from(rows: Vec<[i8; SQUARE_COUNT]>) -> Self {
        let shape = vec![rows.len(), SQUARE_COUNT];
        HostArray { data: rows.iter().flat_map(|row| row.iter().copied()).collect(), shape }
    }
}

impl From<i8> for HostArray {
    fn from(value: i8) -> Self {
        HostArray::scalar(value)
    }
}

impl From<Color> for HostArray {
    fn from(color: Color) -> Self {
        HostArray::scalar(color.code())
    }
}

impl From<Vec<Color>> for HostArray {
    fn from(colors: Vec<Color>) -> Self {
        HostArray::from(colors.into_iter().map(Color::code).collect::<Vec<_>>())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Checks piece and color arrays and stacks them into a batch.
pub fn normalize_boards(piece: &HostArray, color: &HostArray) -> Result<BoardBatch> {
    if piece.shape != color.shape {
        return Err(Error::ShapeMismatch { piece: piece.shape.clone(), color: color.shape.clone() });
    }

    match piece.shape.as_slice() {
        [len] if *len != SQUARE_COUNT => return Err(Error::BoardLength { len: *len }),
        [_] => {},
        [_, squares] if *squares != SQUARE_COUNT => {
            return Err(Error::SquareAxis { shape: piece.shape.clone() });
        },
        [_, _] => {},
        _ => return Err(Error::BoardRank { shape: piece.shape.clone() }),
    }

    let mut batch = BoardBatch::new();
    for (i, (p, c)) in piece.data.chunks(SQUARE_COUNT).zip(color.data.chunks(SQUARE_COUNT)).enumerate() {
        let mut board = Board::empty();
        board.piece.copy_from_slice(p);
        board.color.copy_from_slice(c);
        board.validate(i)?;
        batch.push(board);
    }
    Ok(batch)
}

/// Checks a side-to-move array against `boards` boards, broadcasting a scalar.
pub fn normalize_side_to_move(side_to_move: &HostArray, boards: usize) -> Result<Vec<Color>> {
    match side_to_move.shape.as_slice() {
        [] => Ok(vec![Color::try_from(side_to_move.data[0])?; boards]),
        [len] if *len != boards => Err(Error::SideToMoveLength { expected: boards, got: *len }),
        [_] => side_to_move.data.iter().map(|&code| Color::try_from(code)).collect(),
        _ => Err(Error::SideToMoveRank { shape: side_to_move.shape.clone() }),
    }
}

fn single_board(piece: &HostArray, color: &HostArray) -> Result<Board> {
    let batch = normalize_boards(piece, color)?;
    if batch.len() != 1 {
        return Err(Error::NotSingleBoard { boards: batch.len() });
    }
    Ok(batch.board(0))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Evaluates one board.
pub fn evaluate_position_single<P, C>(backend: &Backend, piece: P, color: C) -> Result<Evaluation>
    where P: Into<HostArray>, C: Into<HostArray>
{
    let board = single_board(&piece.into(), &color.into())?;
    Ok(backend.engine().evaluate(&board))
}

/// Evaluates a batch of boards, returning `(N,)` score columns.
pub fn evaluate_position_batch<P, C>(backend: &Backend, piece: P, color: C) -> Result<BatchEvaluation>
    where P: Into<HostArray>, C: Into<HostArray>
{
    let batch = normalize_boards(&piece.into(), &color.into())?;
    Ok(dispatch::evaluate_batch(backend, &batch))
}

/// Returns the attack maps of one board.
pub fn attack_maps_single<P, C>(backend: &Backend, piece: P, color: C) -> Result<AttackMaps>
    where P: Into<HostArray>, C: Into<HostArray>
{
    let board = single_board(&piece.into(), &color.into())?;
    Ok(backend.engine().compute_attack_maps(&board))
}

/// Returns the attack maps of a batch of boards, `(N, 64)` per color.
pub fn attack_maps_batch<P, C>(backend: &Backend, piece: P, color: C) -> Result<BatchAttackMaps>
    where P: Into<HostArray>, C: Into<HostArray>
{
    let batch = normalize_boards(&piece.into(), &color.into())?;
    Ok(dispatch::compute_attack_maps_batch(backend, &batch))
}

/// Returns the pseudo-legal moves of one board.
pub fn generate_moves_single<P, C, S>(backend: &Backend, piece: P, color: C, side_to_move: S) -> Result<Vec<Move>>
    where P: Into<HostArray>, C: Into<HostArray>, S: Into<HostArray>
{
    let board = single_board(&piece.into(), &color.into())?;
    let side = normalize_side_to_move(&side_to_move.into(), 1)?[0];
    Ok(backend.engine().generate_pseudo_legal_moves(&board, side).to_vec())
}

/// Returns the pseudo-legal moves of a batch of boards as `(M, 5)` rows.
pub fn generate_moves_batch<P, C, S>(backend: &Backend, piece: P, color: C, side_to_move: S) -> Result<PackedMoves>
    where P: Into<HostArray>, C: Into<HostArray>, S: Into<HostArray>
{
    let batch = normalize_boards(&piece.into(), &color.into())?;
    let sides = normalize_side_to_move(&side_to_move.into(), batch.len())?;
    Ok(dispatch::generate_moves_batch(backend, &batch, &sides))
}

#[cfg(test)]
mod api_tests {
    use super::*;

    fn start() -> Board {
        Board::starting_position()
    }

    #[test]
    fn host_array_shapes() {
        assert_eq!(HostArray::from(start().piece).shape(), &[64]);
        assert_eq!(HostArray::from(vec![start().piece; 3]).shape(), &[3, 64]);
        assert_eq!(HostArray::from(1i8).shape(), &[] as &[usize]);
        assert_eq!(
            HostArray::new(vec![0; 10], vec![2, 64]),
            Err(Error::DataLength { expected: 128, got: 10 })
        );
        assert_eq!(
            HostArray::from_rows(&[vec![0i8; 64], vec![0i8; 63]]),
            Err(Error::RaggedRows)
        );
        assert_eq!(HostArray::from_rows(&[[0i8; 64]; 2]).unwrap().shape(), &[2, 64]);
    }

    #[test]
    fn no_rows_is_an_empty_batch() {
        let none: &[&[i8]] = &[];
        let piece = HostArray::from_rows(none).unwrap();
        let color = HostArray::from_rows(none).unwrap();
        assert_eq!(piece.shape(), &[0, 64]);
        assert!(piece.data().is_empty());

        let backend = Backend::cpu();
        assert!(normalize_boards(&piece, &color).unwrap().is_empty());
        assert!(evaluate_position_batch(&backend, piece.clone(), color.clone()).unwrap().is_empty());
        assert!(generate_moves_batch(&backend, piece, color, Vec::<i8>::new()).unwrap().is_empty());
    }

    #[test]
    fn board_shapes() {
        let board = start();
        let single = normalize_boards(&board.piece.into(), &board.color.into()).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.board(0), board);

        let short = HostArray::from(vec![0i8; 63]);
        assert_eq!(normalize_boards(&short, &short), Err(Error::BoardLength { len: 63 }));

        let wide = HostArray::new(vec![0; 130], vec![2, 65]).unwrap();
        assert_eq!(normalize_boards(&wide, &wide), Err(Error::SquareAxis { shape: vec![2, 65] }));

        let cube = HostArray::new(vec![0; 128], vec![1, 2, 64]).unwrap();
        assert_eq!(normalize_boards(&cube, &cube), Err(Error::BoardRank { shape: vec![1, 2, 64] }));

        let scalar = HostArray::scalar(0);
        assert_eq!(normalize_boards(&scalar, &scalar), Err(Error::BoardRank { shape: vec![] }));

        let batch = HostArray::from(vec![board.piece; 2]);
        assert_eq!(
            normalize_boards(&batch, &board.color.into()),
            Err(Error::ShapeMismatch { piece: vec![2, 64], color: vec![64] })
        );
    }

    #[test]
    fn invalid_codes_are_rejected() {
        let mut board = start();
        board.color[9] = 5;
        let batch = HostArray::from(vec![start().color, board.color]);
        assert_eq!(
            normalize_boards(&HostArray::from(vec![board.piece; 2]), &batch),
            Err(Error::InvalidColorCode { board: 1, square: 9, code: 5 })
        );
    }

    #[test]
    fn side_to_move_shapes() {
        assert_eq!(normalize_side_to_move(&Color::Black.into(), 3).unwrap(), vec![Color::Black; 3]);
        assert_eq!(
            normalize_side_to_move(&vec![0i8, 1].into(), 2).unwrap(),
            vec![Color::White, Color::Black]
        );
        assert_eq!(
            normalize_side_to_move(&vec![0i8, 1, 0].into(), 4),
            Err(Error::SideToMoveLength { expected: 4, got: 3 })
        );
        assert_eq!(
            normalize_side_to_move(&HostArray::new(vec![0; 4], vec![2, 2]).unwrap(), 2),
            Err(Error::SideToMoveRank { shape: vec![2, 2] })
        );
        assert_eq!(
            normalize_side_to_move(&HostArray::scalar(2), 1),
            Err(Error::InvalidSideToMove { code: 2 })
        );
    }

    #[test]
    fn single_calls() {
        let backend = Backend::cpu();
        let board = start();

        let eval = evaluate_position_single(&backend, board.piece, board.color).unwrap();
        assert_eq!(eval.white_offense, eval.black_offense);
        assert!(eval.white_offense > 0);

        let maps = attack_maps_single(&backend, board.piece, board.color).unwrap();
        assert_eq!(maps.count(Color::White), maps.count(Color::Black));

        let moves = generate_moves_single(&backend, board.piece, board.color, Color::White).unwrap();
        assert_eq!(moves.len(), 20);
        assert_eq!(moves[0].to_string(), "b1a3");
    }

    #[test]
    fn single_calls_reject_batches() {
        let backend = Backend::cpu();
        let board = start();
        assert_eq!(
            evaluate_position_single(&backend, vec![board.piece; 2], vec![board.color; 2]),
            Err(Error::NotSingleBoard { boards: 2 })
        );
        assert_eq!(
            generate_moves_single(&backend, vec![board.piece; 1], vec![board.color; 1], 0i8).unwrap().len(),
            20
        );
    }

    #[test]
    fn batch_calls() {
        let backend = Backend::cpu();
        let board = start();

        let evals = evaluate_position_batch(&backend, vec![board.piece; 3], vec![board.color; 3]).unwrap();
        assert_eq!(evals.white_offense, vec![4034; 3]);

        let maps = attack_maps_batch(&backend, board.piece, board.color).unwrap();
        assert_eq!(maps.len(), 1);

        let moves = generate_moves_batch(
            &backend,
            vec![board.piece; 2],
            vec![board.color; 2],
            vec![Color::White, Color::Black],
        ).unwrap();
        assert_eq!(moves.len(), 40);
        assert_eq!(moves.rows()[20][0], 1);

        assert_eq!(
            generate_moves_batch(&backend, vec![board.piece; 2], vec![board.color; 2], vec![0i8; 3]),
            Err(Error::SideToMoveLength { expected: 2, got: 3 })
        );
    }
}
