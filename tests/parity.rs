//! Tests that batch results agree with single-position results and that the device backend agrees
//! with the CPU backend.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

mod parity {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use bishopforge::api;
    use bishopforge::backend::Backend;
    use bishopforge::chess::{Board, BoardBatch, Color};
    use bishopforge::device::Device;
    use bishopforge::engine::{cpu, Engine, CpuEngine};
    use bishopforge::engine::batch as dispatch;
    use bishopforge::sample::{random_batch, scattered_board};

    fn device_backend() -> Backend {
        Backend::with_device(Device::open(2).expect("failed to open device"))
    }

    fn scattered_batch(seed: u64, n: usize, pieces: usize) -> (BoardBatch, Vec<Color>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let batch = BoardBatch::from_boards((0..n).map(|_| scattered_board(&mut rng, pieces)));
        let sides = (0..n).map(|i| if i % 2 == 0 { Color::White } else { Color::Black }).collect();
        (batch, sides)
    }

    #[test]
    fn batch_moves_split_back_into_single_results() {
        let (batch, sides) = random_batch(5, 12, 16);
        for backend in &[Backend::cpu(), device_backend()] {
            let packed = dispatch::generate_moves_batch(backend, &batch, &sides);
            let counts = packed.counts(batch.len());
            assert_eq!(counts.iter().sum::<usize>(), packed.len());

            for (i, board) in batch.iter().enumerate() {
                let single = api::generate_moves_single(
                    backend, board.piece, board.color, sides[i]).unwrap();
                assert_eq!(packed.for_board(i), single, "board {} on {}", i, backend.name());
            }
        }
    }

    #[test]
    fn device_matches_cpu_on_played_positions() {
        let (batch, sides) = random_batch(17, 64, 24);
        let cpu = Backend::cpu();
        let device = device_backend();

        let cpu_maps = dispatch::compute_attack_maps_batch(&cpu, &batch);
        let device_maps = dispatch::compute_attack_maps_batch(&device, &batch);
        assert_eq!(cpu_maps, device_maps);

        let cpu_moves = dispatch::generate_moves_batch(&cpu, &batch, &sides);
        let device_moves = dispatch::generate_moves_batch(&device, &batch, &sides);
        assert_eq!(cpu_moves, device_moves);

        let cpu_evals = dispatch::evaluate_batch(&cpu, &batch);
        let device_evals = dispatch::evaluate_batch(&device, &batch);
        for (i, (a, b)) in cpu_evals.iter().zip(device_evals.iter()).enumerate() {
            assert!(a.within_tolerance(&b), "board {}: {:?} vs {:?}", i, a, b);
        }
    }

    #[test]
    fn device_matches_cpu_on_scattered_positions() {
        let (batch, sides) = scattered_batch(23, 48, 16);
        let cpu = Backend::cpu();
        let device = device_backend();

        assert_eq!(
            dispatch::compute_attack_maps_batch(&cpu, &batch),
            dispatch::compute_attack_maps_batch(&device, &batch)
        );
        assert_eq!(
            dispatch::generate_moves_batch(&cpu, &batch, &sides),
            dispatch::generate_moves_batch(&device, &batch, &sides)
        );
    }

    #[test]
    fn single_position_engines_agree_exactly() {
        let (batch, sides) = random_batch(29, 16, 30);
        let device = device_backend();
        let engine = device.engine();

        for (board, &side) in batch.iter().zip(&sides) {
            assert_eq!(engine.compute_attack_maps(&board), cpu::compute_attack_maps(&board));
            assert_eq!(engine.evaluate(&board), CpuEngine::new().evaluate(&board));
            assert_eq!(
                engine.generate_pseudo_legal_moves(&board, side).to_vec(),
                cpu::generate_pseudo_legal_moves(&board, side).to_vec()
            );
        }
    }

    #[test]
    fn identical_boards_give_identical_results() {
        let board = Board::starting_position();
        let n = 300;
        for backend in &[Backend::cpu(), device_backend()] {
            let piece = vec![board.piece; n];
            let color = vec![board.color; n];

            let evals = api::evaluate_position_batch(backend, piece.clone(), color.clone()).unwrap();
            let first = evals.get(0);
            assert!(evals.iter().all(|e| e == first));

            let maps = api::attack_maps_batch(backend, piece.clone(), color.clone()).unwrap();
            let first = maps.get(0);
            assert!(maps.iter().all(|m| m == first));

            let moves = api::generate_moves_batch(backend, piece, color, Color::White).unwrap();
            assert_eq!(moves.counts(n), vec![20; n]);
            let first = moves.for_board(0);
            assert!((1..n).all(|i| moves.for_board(i) == first));
        }
    }

    #[test]
    fn empty_batches() {
        for backend in &[Backend::cpu(), device_backend()] {
            let none: Vec<[i8; 64]> = Vec::new();
            assert_eq!(api::evaluate_position_batch(backend, none.clone(), none.clone()).unwrap().len(), 0);
            assert_eq!(api::attack_maps_batch(backend, none.clone(), none.clone()).unwrap().len(), 0);
            assert!(api::generate_moves_batch(backend, none.clone(), none, Color::White).unwrap().is_empty());
        }
    }
}
