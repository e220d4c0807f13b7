//! Configuration file and environment overrides.
//!
//! The configuration is read from YAML, by default from `~/.bishopforge/config.yaml`. Any field
//! may be left out. `BF_BACKEND` and `BF_LOG_LEVEL` override the file.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// Environment variable overriding [`BackendConfig::preference`]
pub const BACKEND_VAR: &str = "BF_BACKEND";

/// Environment variable overriding [`LogConfig::level`]
pub const LOG_LEVEL_VAR: &str = "BF_LOG_LEVEL";

/// Log levels accepted in the configuration
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Errors reading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(PathBuf, io::Error),
    /// The file is not valid YAML for a configuration
    Parse(PathBuf, serde_yaml::Error),
    /// An environment variable or field holds an unknown value
    Invalid {
        /// Name of the variable or field
        name: String,
        /// Offending value
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            ConfigError::Parse(path, err) => write!(f, "{}: {}", path.display(), err),
            ConfigError::Invalid { name, value } => write!(f, "{}: invalid value '{}'", name, value),
        }
    }
}

impl std::error::Error for ConfigError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Which backend to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    /// Use the device if the probe succeeds, otherwise the CPU
    Auto,
    /// Always use the CPU; the device is never probed
    Cpu,
    /// Use the device, warning if it is unavailable and the CPU has to be used instead
    Device,
}

impl Default for Preference {
    fn default() -> Self {
        Preference::Auto
    }
}

impl FromStr for Preference {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Preference::Auto),
            "cpu" => Ok(Preference::Cpu),
            "device" | "gpu" => Ok(Preference::Device),
            _ => Err(ConfigError::Invalid { name: BACKEND_VAR.to_owned(), value: s.to_owned() }),
        }
    }
}

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend preference
    pub preference: Preference,
    /// Number of device workers, 0 for one per logical CPU
    pub threads: usize,
}

/// Logging, used by the binary only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Turns on logging
    pub enabled: bool,
    /// Log file
    pub file: PathBuf,
    /// One of [`LOG_LEVELS`]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            enabled: false,
            file: PathBuf::from("bishopforge.log"),
            level: "info".to_owned(),
        }
    }
}

/// Benchmark parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Batch sizes to time
    pub batch_sizes: Vec<usize>,
    /// Random plies played from the starting position per board; 0 replicates the starting
    /// position
    pub plies: usize,
    /// Seed for the random positions
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            batch_sizes: vec![1, 16, 256, 4096],
            plies: 0,
            seed: 0,
        }
    }
}

/// The whole configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend selection
    pub backend: BackendConfig,
    /// Logging
    pub log: LogConfig,
    /// Benchmarks
    pub bench: BenchConfig,
}

impl Config {
    /// Returns the default configuration file, `~/.bishopforge/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".bishopforge").join("config.yaml"))
    }

    /// Parses a YAML configuration.
    pub fn from_yaml(s: &str) -> Result<Config, serde_yaml::Error> {
        if s.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(s)
    }

    /// Reads the configuration from `path`, or from the default file if `path` is `None`. A missing
    /// default file gives the default configuration; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_owned(), true),
            None => match Config::default_path() {
                Some(path) => (path, false),
                None => return Ok(Config::default()),
            },
        };

        let s = match read_to_string(&path) {
            Ok(s) => s,
            Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {
                return Ok(Config::default());
            },
            Err(err) => return Err(ConfigError::Io(path, err)),
        };

        let mut config = Config::from_yaml(&s).map_err(|err| ConfigError::Parse(path, err))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the `BF_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name through `var`.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        if let Some(value) = var(BACKEND_VAR) {
            self.backend.preference = value.parse()?;
        }
        if let Some(value) = var(LOG_LEVEL_VAR) {
            self.log.level = value.trim().to_lowercase();
        }
        self.validate()
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        self.log.level = self.log.level.to_lowercase();
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::Invalid {
                name: "log.level".to_owned(),
                value: self.log.level.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::default().backend.preference, Preference::Auto);
        assert_eq!(Config::default().log.file, PathBuf::from("bishopforge.log"));
    }

    #[test]
    fn partial_file() {
        let config = Config::from_yaml("backend:\n  preference: cpu\nbench:\n  plies: 12\n").unwrap();
        assert_eq!(config.backend.preference, Preference::Cpu);
        assert_eq!(config.backend.threads, 0);
        assert_eq!(config.bench.plies, 12);
        assert_eq!(config.bench.batch_sizes, BenchConfig::default().batch_sizes);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn unknown_preference_is_rejected() {
        assert!(Config::from_yaml("backend:\n  preference: quantum\n").is_err());
        assert!("quantum".parse::<Preference>().is_err());
        assert_eq!("GPU".parse::<Preference>().unwrap(), Preference::Device);
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = Config::default();
        config.backend.preference = Preference::Device;
        config.bench.seed = 42;
        let s = serde_yaml::to_string(&config).unwrap();
        assert!(s.contains("preference: device"));
        assert_eq!(Config::from_yaml(&s).unwrap(), config);
    }

    #[test]
    fn overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            BACKEND_VAR => Some("cpu".to_owned()),
            LOG_LEVEL_VAR => Some("DEBUG".to_owned()),
            _ => None,
        }).unwrap();
        assert_eq!(config.backend.preference, Preference::Cpu);
        assert_eq!(config.log.level, "debug");

        let mut config = Config::default();
        assert!(config.apply_overrides(|name| {
            if name == LOG_LEVEL_VAR { Some("loud".to_owned()) } else { None }
        }).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = Path::new("/nonexistent/bishopforge/config.yaml");
        match Config::load(Some(path)) {
            Err(ConfigError::Io(p, _)) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other),
        }
    }
}
