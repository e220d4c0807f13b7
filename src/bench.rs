//! Benchmarks comparing a per-board CPU loop with the active backend's batch routines.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::fs::write;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use chrono::Local;
use log::info;
use serde::{Serialize, Deserialize};
use crate::backend::Backend;
use crate::chess::{Board, BoardBatch, Color};
use crate::config::BenchConfig;
use crate::engine::{BatchOp, cpu};
use crate::engine::batch as dispatch;
use crate::sample::random_batch;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Timing of one operation at one batch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchRow {
    /// Operation name
    pub op: String,
    /// Number of boards
    pub batch_size: usize,
    /// Milliseconds taken by the CPU loop
    pub cpu_ms: f64,
    /// Milliseconds taken by the backend's batch routine
    pub backend_ms: f64,
    /// `cpu_ms / backend_ms`, or 0 if the backend took no measurable time
    pub speedup: f64,
}

/// A complete benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    /// Date of the run
    pub date: String,
    /// Name of the host the run was made on
    pub host: String,
    /// Backend description
    pub backend: String,
    /// Random plies per board, 0 for the starting position
    pub plies: usize,
    /// Results
    pub rows: Vec<BenchRow>,
}

impl BenchReport {
    /// Writes the report as YAML.
    pub fn write_yaml(&self, path: &Path) -> io::Result<()> {
        let s = serde_yaml::to_string(self)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        write(path, s)
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} on {}, {}", self.backend, self.host, self.date)?;
        writeln!(f, "{:<16} {:>10} {:>14} {:>14} {:>9}", "Operation", "Batch", "CPU", "Backend", "Speedup")?;
        for row in &self.rows {
            writeln!(f, "{:<16} {:>10} {:>11.2} ms {:>11.2} ms {:>8.1}x",
                row.op, row.batch_size, row.cpu_ms, row.backend_ms, row.speedup)?;
        }
        Ok(())
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Runs `f` once to warm up, then times a second run.
fn time<F: FnMut()>(mut f: F) -> Duration {
    f();
    let start = Instant::now();
    f();
    start.elapsed()
}

fn boards(config: &BenchConfig, n: usize) -> (BoardBatch, Vec<Color>) {
    if config.plies == 0 {
        (BoardBatch::repeat(&Board::starting_position(), n), vec![Color::White; n])
    } else {
        random_batch(config.seed, n, config.plies)
    }
}

fn measure(backend: &Backend, op: BatchOp, batch: &BoardBatch, sides: &[Color]) -> BenchRow {
    let cpu_loop = || match op {
        BatchOp::Evaluate => for board in batch.iter() {
            cpu::evaluate(&board);
        },
        BatchOp::AttackMaps => for board in batch.iter() {
            cpu::compute_attack_maps(&board);
        },
        BatchOp::GenerateMoves => for (board, &side) in batch.iter().zip(sides) {
            cpu::generate_pseudo_legal_moves(&board, side);
        },
    };
    let batched = || match op {
        BatchOp::Evaluate => { dispatch::evaluate_batch(backend, batch); },
        BatchOp::AttackMaps => { dispatch::compute_attack_maps_batch(backend, batch); },
        BatchOp::GenerateMoves => { dispatch::generate_moves_batch(backend, batch, sides); },
    };

    let cpu_ms = millis(time(cpu_loop));
    let backend_ms = millis(time(batched));

    BenchRow {
        op: op.to_string(),
        batch_size: batch.len(),
        cpu_ms,
        backend_ms,
        speedup: if backend_ms > 0.0 { cpu_ms / backend_ms } else { 0.0 },
    }
}

/// Times every batch operation at every configured batch size.
pub fn run(backend: &Backend, config: &BenchConfig) -> BenchReport {
    let host = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_owned());

    let mut rows = Vec::new();
    for &op in BatchOp::ALL.iter() {
        for &n in &config.batch_sizes {
            let (batch, sides) = boards(config, n);
            let row = measure(backend, op, &batch, &sides);
            info!("{} x{}: cpu {:.2} ms, {} {:.2} ms",
                row.op, row.batch_size, row.cpu_ms, backend.name(), row.backend_ms);
            rows.push(row);
        }
    }

    BenchReport {
        date: Local::now().format("%Y.%m.%d %H:%M").to_string(),
        host,
        backend: backend.info(),
        plies: config.plies,
        rows,
    }
}
