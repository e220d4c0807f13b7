//! Tests known properties of attack maps, evaluation and move generation through the public entry
//! points.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

mod properties {
    use bishopforge::api::{self, HostArray};
    use bishopforge::backend::Backend;
    use bishopforge::chess::{Board, Color, Piece, MoveFlags, MOVE_FIELDS};
    use bishopforge::chess::error::Error;
    use bishopforge::device::Device;

    fn backends() -> Vec<Backend> {
        vec![Backend::cpu(), Backend::with_device(Device::open(2).expect("failed to open device"))]
    }

    fn lone(color: Color, piece: Piece, sq: u8) -> Board {
        let mut board = Board::empty();
        board.put(sq, color, piece);
        board
    }

    #[test]
    fn empty_board_attacks_nothing() {
        for backend in &backends() {
            let board = Board::empty();
            let maps = api::attack_maps_single(backend, board.piece, board.color).unwrap();
            assert_eq!(maps.count(Color::White), 0);
            assert_eq!(maps.count(Color::Black), 0);

            let eval = api::evaluate_position_single(backend, board.piece, board.color).unwrap();
            assert_eq!(eval.to_array(), [0, 0, 0, 0]);
        }
    }

    fn on_board(sq: u8, steps: &[(i8, i8)]) -> usize {
        let (file, rank) = ((sq % 8) as i8, (sq / 8) as i8);
        steps.iter()
            .filter(|&&(df, dr)| (0..8).contains(&(file + df)) && (0..8).contains(&(rank + dr)))
            .count()
    }

    #[test]
    fn knight_and_king_target_counts() {
        let knight: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
        let king: [(i8, i8); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

        for backend in &backends() {
            let boards: Vec<(Piece, u8, Board)> = (0..64u8)
                .flat_map(|sq| vec![
                    (Piece::Knight, sq, lone(Color::White, Piece::Knight, sq)),
                    (Piece::King, sq, lone(Color::White, Piece::King, sq)),
                ])
                .collect();
            let maps = api::attack_maps_batch(
                backend,
                boards.iter().map(|(_, _, board)| board.piece).collect::<Vec<_>>(),
                boards.iter().map(|(_, _, board)| board.color).collect::<Vec<_>>(),
            ).unwrap();

            for (i, &(piece, sq, _)) in boards.iter().enumerate() {
                let (file, rank) = (sq % 8, sq / 8);
                let (inner, steps) = match piece {
                    Piece::Knight => (2..=5, &knight),
                    _ => (1..=6, &king),
                };
                let count = maps.get(i).count(Color::White);
                if inner.contains(&file) && inner.contains(&rank) {
                    assert_eq!(count, 8, "{} on {}", piece, sq);
                }
                assert_eq!(count, on_board(sq, steps), "{} on {}", piece, sq);
                assert_eq!(maps.get(i).count(Color::Black), 0);
            }
        }
    }

    #[test]
    fn rook_in_the_corner() {
        for backend in &backends() {
            let board = lone(Color::Black, Piece::Rook, 0);
            let maps = api::attack_maps_single(backend, board.piece, board.color).unwrap();
            assert_eq!(maps.count(Color::Black), 14);
            assert_eq!(maps.count(Color::White), 0);
        }
    }

    #[test]
    fn pawns_attack_diagonally_only() {
        for backend in &backends() {
            let board = lone(Color::White, Piece::Pawn, 12);
            let maps = api::attack_maps_single(backend, board.piece, board.color).unwrap();
            assert!(maps.attacks(Color::White, 19));
            assert!(maps.attacks(Color::White, 21));
            assert!(!maps.attacks(Color::White, 20));
            assert_eq!(maps.count(Color::White), 2);
        }
    }

    #[test]
    fn starting_position_moves() {
        let board = Board::starting_position();
        for backend in &backends() {
            for &side in [Color::White, Color::Black].iter() {
                let moves = api::generate_moves_single(backend, board.piece, board.color, side).unwrap();
                assert_eq!(moves.len(), 20);
                assert!(moves.iter().all(|mv| !mv.is_capture()));
                assert_eq!(moves.iter().filter(|mv| mv.flags.contains(MoveFlags::DOUBLE_PUSH)).count(), 8);
            }
        }
    }

    #[test]
    fn blocked_promotion_has_no_moves_and_open_promotion_has_four() {
        for backend in &backends() {
            let mut board = lone(Color::White, Piece::Pawn, 52);
            let moves = api::generate_moves_single(backend, board.piece, board.color, Color::White).unwrap();
            assert_eq!(moves.len(), 4);
            assert!(moves.iter().all(|mv| !mv.is_capture() && mv.to_sq == 60));
            let promos: Vec<_> = moves.iter().filter_map(|mv| mv.promotion_piece()).collect();
            assert_eq!(promos, Piece::PROMOTIONS.to_vec());

            board.put(60, Color::Black, Piece::Rook);
            let moves = api::generate_moves_single(backend, board.piece, board.color, Color::White).unwrap();
            assert!(moves.is_empty());
        }
    }

    #[test]
    fn move_rows_are_packed() {
        let board = Board::starting_position();
        let moves = api::generate_moves_batch(
            &Backend::cpu(),
            vec![board.piece, Board::empty().piece, board.piece],
            vec![board.color, Board::empty().color, board.color],
            vec![Color::White, Color::White, Color::Black],
        ).unwrap();

        assert_eq!(moves.counts(3), vec![20, 0, 20]);
        assert!(moves.rows().iter().all(|row| row.len() == MOVE_FIELDS));
        assert_eq!(moves.rows()[0], [0, 1, 16, 0, 0]);
        assert_eq!(moves.rows()[20][0], 2);
        assert!(moves.iter().skip(20).all(|m| m.board_idx == 2));
    }

    #[test]
    fn starting_position_scores() {
        let board = Board::starting_position();
        let eval = api::evaluate_position_single(&Backend::cpu(), board.piece, board.color).unwrap();
        assert_eq!(eval.white_offense, eval.black_offense);
        assert_eq!(eval.white_defense, eval.black_defense);
        assert_eq!(eval.white_defense, 100);
        assert_eq!(eval.white_offense, 4034);
    }

    #[test]
    fn contract_violations() {
        let backend = Backend::cpu();
        let board = Board::starting_position();

        assert_eq!(
            api::evaluate_position_batch(&backend, vec![0i8; 63], vec![-1i8; 63]),
            Err(Error::BoardLength { len: 63 })
        );
        assert_eq!(
            api::attack_maps_batch(&backend, vec![board.piece; 2], vec![board.color; 3]),
            Err(Error::ShapeMismatch { piece: vec![2, 64], color: vec![3, 64] })
        );
        assert_eq!(
            api::attack_maps_batch(
                &backend,
                HostArray::new(vec![0; 2 * 32], vec![2, 32]).unwrap(),
                HostArray::new(vec![-1; 2 * 32], vec![2, 32]).unwrap(),
            ),
            Err(Error::SquareAxis { shape: vec![2, 32] })
        );
        assert_eq!(
            api::generate_moves_batch(&backend, vec![board.piece; 2], vec![board.color; 2], vec![0i8; 3]),
            Err(Error::SideToMoveLength { expected: 2, got: 3 })
        );
        assert_eq!(
            api::generate_moves_batch(&backend, vec![board.piece; 2], vec![board.color; 2], 2i8),
            Err(Error::InvalidSideToMove { code: 2 })
        );
        assert_eq!(
            api::evaluate_position_single(&backend, vec![board.piece; 2], vec![board.color; 2]),
            Err(Error::NotSingleBoard { boards: 2 })
        );

        let mut bad = board;
        bad.piece[5] = 7;
        assert_eq!(
            api::attack_maps_batch(&backend, vec![board.piece, bad.piece], vec![board.color, bad.color]),
            Err(Error::InvalidPieceCode { board: 1, square: 5, code: 7 })
        );
    }
}
