//! Batched chess position computations: attack maps, evaluation and pseudo-legal moves for one or
//! many positions at once, on a data-parallel device when one is available and on the CPU
//! otherwise.
//!
//! # Example
//! ```
//! use bishopforge::api;
//! use bishopforge::backend::Backend;
//! use bishopforge::chess::{Board, Color};
//!
//! let backend = Backend::cpu();
//! let board = Board::starting_position();
//! let moves = api::generate_moves_batch(
//!     &backend,
//!     vec![board.piece; 4],
//!     vec![board.color; 4],
//!     Color::White,
//! ).unwrap();
//! assert_eq!(moves.len(), 80);
//! ```
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]
#![warn(clippy::unimplemented, clippy::todo)]
#![warn(clippy::unwrap_used)]

pub mod chess;
pub mod device;
pub mod engine;
pub mod backend;
pub mod api;
pub mod config;
pub mod sample;
pub mod bench;
