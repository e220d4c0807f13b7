//! The bishopforge command line tool.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]
#![warn(clippy::unimplemented, clippy::todo)]
#![warn(clippy::unwrap_used)]

use std::fs::{read_to_string, File};
use std::path::{Path, PathBuf};
use clap::{App, Arg, SubCommand, AppSettings, ArgMatches, crate_version};
use log::{error, info};
use serde::Deserialize;
use simplelog::{WriteLogger, LevelFilter};
use bishopforge::api::{self, HostArray};
use bishopforge::backend::Backend;
use bishopforge::bench;
use bishopforge::chess::{self, Board, BoardBatch, Color, square_name};
use bishopforge::config::{Config, ConfigError};
use bishopforge::engine::{CpuEngine, Engine};
use bishopforge::engine::batch as dispatch;

fn main() -> Result<(), Error> {
    let matches =
        App::new("BishopForge")
            .version(crate_version!())
            .about("Batched attack maps, evaluation and move generation for chess positions.")
            .setting(AppSettings::SubcommandRequired)
            .arg(Arg::with_name("config")
                .long("config")
                .short("c")
                .global(true)
                .value_name("FILE")
                .takes_value(true)
                .help("Reads the configuration from FILE instead of ~/.bishopforge/config.yaml"))
            .arg(Arg::with_name("log")
                .long("log")
                .short("l")
                .global(true)
                .help("Turns on logging"))
            .arg(Arg::with_name("log-file")
                .long("log-file")
                .global(true)
                .value_name("LOG_FILE")
                .takes_value(true)
                .default_value("bishopforge.log")
                .help("Sets the log file if logging is turned on"))
            .arg(Arg::with_name("log-level")
                .long("log-level")
                .global(true)
                .value_name("LEVEL")
                .takes_value(true)
                .default_value("info")
                .help("Sets the log level if logging is turned on"))
            .subcommand(SubCommand::with_name("probe")
                .about("Reports the selected backend and checks it against the CPU engine"))
            .subcommand(SubCommand::with_name("bench")
                .about("Times the CPU loop against the backend's batch routines")
                .arg(Arg::with_name("sizes")
                    .long("sizes")
                    .short("s")
                    .value_name("N,N,...")
                    .takes_value(true)
                    .use_delimiter(true)
                    .help("Batch sizes to time"))
                .arg(Arg::with_name("plies")
                    .long("plies")
                    .short("p")
                    .value_name("PLIES")
                    .takes_value(true)
                    .help("Random plies played per board; 0 uses the starting position"))
                .arg(Arg::with_name("report")
                    .long("report")
                    .short("r")
                    .value_name("FILE")
                    .takes_value(true)
                    .help("Writes the results to FILE as YAML")))
            .subcommand(SubCommand::with_name("analyze")
                .about("Prints scores, attacked squares and moves for a list of positions")
                .arg(Arg::with_name("positions")
                    .value_name("FILE")
                    .help("YAML list of {piece, color, side} records; defaults to the \
                           starting position with white to move")))
            .get_matches();

    let mut config = Config::load(matches.value_of_os("config").map(Path::new))?;
    config.apply_env()?;

    init_logging(&matches, &config)?;
    let backend = Backend::from_config(&config.backend);

    match matches.subcommand() {
        ("probe", Some(_)) => probe(&backend),
        ("bench", Some(matches)) => run_bench(&backend, config, matches),
        ("analyze", Some(matches)) => analyze(&backend, matches.value_of_os("positions").map(Path::new)),
        _ => unreachable!(),
    }
}

fn init_logging(matches: &ArgMatches<'_>, config: &Config) -> Result<(), Error> {
    let enabled = matches.is_present("log") || config.log.enabled;
    let log_file = if matches.occurrences_of("log-file") > 0 {
        PathBuf::from(matches.value_of_os("log-file").expect("INFALLIBLE"))
    } else {
        config.log.file.clone()
    };
    let level = if matches.occurrences_of("log-level") > 0 {
        matches.value_of("log-level").expect("INFALLIBLE")
    } else {
        config.log.level.as_str()
    };

    let log_level = match level {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        level => return Err(Error(format!("{}: invalid log level", level))),
    };

    let _logger = if enabled {
        WriteLogger::init(
            log_level,
            simplelog::Config::default(),
            File::create(&log_file).map_err(|err| {
                Error(format!("{}: {}", log_file.display(), err))
            })?)
    } else {
        WriteLogger::init(LevelFilter::Off, simplelog::Config::default(), std::io::sink())
    };

    Ok(())
}

fn check(name: &str, passed: bool) -> bool {
    println!("  {:<40} {}", name, if passed { "ok" } else { "FAILED" });
    if !passed {
        error!("self-check failed: {}", name);
    }
    passed
}

fn probe(backend: &Backend) -> Result<(), Error> {
    println!("{}", backend.info());

    let board = Board::starting_position();
    let cpu = CpuEngine::new();
    let engine = backend.engine();
    let batch = BoardBatch::repeat(&board, 8);
    let sides = vec![Color::White; batch.len()];

    let maps = dispatch::compute_attack_maps_batch(backend, &batch);
    let evals = dispatch::evaluate_batch(backend, &batch);
    let moves = dispatch::generate_moves_batch(backend, &batch, &sides);

    let results = [
        check("single-position attack maps",
            engine.compute_attack_maps(&board) == cpu.compute_attack_maps(&board)),
        check("single-position evaluation",
            engine.evaluate(&board) == cpu.evaluate(&board)),
        check("single-position moves",
            engine.generate_pseudo_legal_moves(&board, Color::White).to_vec()
                == cpu.generate_pseudo_legal_moves(&board, Color::White).to_vec()),
        check("batch attack maps",
            maps.iter().all(|m| m == cpu.compute_attack_maps(&board))),
        check("batch move counts",
            moves.counts(batch.len()).iter().all(|&n| n == 20)),
        check("batch evaluation within tolerance",
            evals.iter().all(|e| e.within_tolerance(&cpu.evaluate(&board)))),
    ];

    if results.iter().all(|&passed| passed) {
        info!("self-check passed on {}", backend.name());
        Ok(())
    } else {
        Err(Error("self-check failed".to_owned()))
    }
}

fn run_bench(backend: &Backend, config: Config, matches: &ArgMatches<'_>) -> Result<(), Error> {
    let mut bench_config = config.bench;
    if let Some(sizes) = matches.values_of("sizes") {
        bench_config.batch_sizes = sizes
            .map(|s| s.trim().parse::<usize>().map_err(|_| Error(format!("{}: invalid batch size", s))))
            .collect::<Result<_, _>>()?;
    }
    if let Some(plies) = matches.value_of("plies") {
        bench_config.plies = plies.parse().map_err(|_| Error("plies must be numeric".to_owned()))?;
    }

    let report = bench::run(backend, &bench_config);
    println!("{}", report);

    if let Some(path) = matches.value_of_os("report") {
        let path = Path::new(path);
        report.write_yaml(path).map_err(|err| Error(format!("{}: {}", path.display(), err)))?;
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct Position {
    piece: Vec<i8>,
    color: Vec<i8>,
    #[serde(default)]
    side: i8,
}

fn read_positions(path: Option<&Path>) -> Result<Vec<Position>, Error> {
    match path {
        Some(path) => {
            let s = read_to_string(path).map_err(|err| Error(format!("{}: {}", path.display(), err)))?;
            Ok(serde_yaml::from_str(&s)?)
        },
        None => {
            let board = Board::starting_position();
            Ok(vec![Position { piece: board.piece.to_vec(), color: board.color.to_vec(), side: 0 }])
        },
    }
}

fn analyze(backend: &Backend, path: Option<&Path>) -> Result<(), Error> {
    let positions = read_positions(path)?;
    let piece = HostArray::from_rows(&positions.iter().map(|p| p.piece.as_slice()).collect::<Vec<_>>())?;
    let color = HostArray::from_rows(&positions.iter().map(|p| p.color.as_slice()).collect::<Vec<_>>())?;
    let side = HostArray::from(positions.iter().map(|p| p.side).collect::<Vec<_>>());

    let evals = api::evaluate_position_batch(backend, piece.clone(), color.clone())?;
    let maps = api::attack_maps_batch(backend, piece.clone(), color.clone())?;
    let moves = api::generate_moves_batch(backend, piece, color, side)?;

    println!("{}", backend.info());
    for i in 0..positions.len() {
        let eval = evals.get(i);
        let board_maps = maps.get(i);
        println!();
        println!("Position {} ({} to move)", i + 1,
            if positions[i].side == Color::Black.code() { Color::Black } else { Color::White });
        println!("  offense  white {:>6}  black {:>6}", eval.white_offense, eval.black_offense);
        println!("  defense  white {:>6}  black {:>6}", eval.white_defense, eval.black_defense);
        println!("  attacked white {:>6}  black {:>6}",
            board_maps.count(Color::White), board_maps.count(Color::Black));

        let list: Vec<String> = moves.for_board(i)
            .iter()
            .map(|mv| {
                if mv.is_capture() {
                    format!("{}x{}", square_name(mv.from_sq), &mv.to_string()[2..])
                } else {
                    mv.to_string()
                }
            })
            .collect();
        println!("  moves ({}): {}", list.len(), list.join(" "));
    }

    Ok(())
}

struct Error(String);

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error { }

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error(err.to_string())
    }
}

impl From<chess::error::Error> for Error {
    fn from(err: chess::error::Error) -> Self {
        Error(err.to_string())
    }
}
