//! Selection of the compute backend.
//!
//! A [`Backend`] is chosen once and never changes. It holds the runtime the batch kernels run on
//! and the engine used for single positions. Components take a `&Backend` so tests can force
//! either path. [`Backend::global`] probes once per process for callers that just want the best
//! available backend.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::sync::Arc;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use crate::config::{BackendConfig, Preference};
use crate::device::{Device, DeviceError};
use crate::engine::{Engine, BatchKernels, BatchOp, CpuEngine, DeviceEngine};

lazy_static! {
    static ref GLOBAL: Backend = Backend::probe(0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Where batch computations run.
#[derive(Debug, Clone)]
pub enum Runtime {
    /// The calling thread
    Host,
    /// A compute device
    Device(Arc<Device>),
}

/// The selected backend.
pub struct Backend {
    runtime: Runtime,
    engine: Box<dyn Engine>,
}

impl Backend {
    /// Returns the CPU backend. Nothing is probed.
    pub fn cpu() -> Backend {
        Backend { runtime: Runtime::Host, engine: Box::new(CpuEngine::new()) }
    }

    /// Returns a backend running on `device`.
    pub fn with_device(device: Device) -> Backend {
        let device = Arc::new(device);
        Backend {
            runtime: Runtime::Device(Arc::clone(&device)),
            engine: Box::new(DeviceEngine::new(device)),
        }
    }

    /// Probes for a device with `threads` workers (0 for one per logical CPU) and falls back to
    /// the CPU if anything goes wrong. Failures are not errors.
    pub fn probe(threads: usize) -> Backend {
        Backend::probe_from(Device::probe(threads))
    }

    /// Returns a backend for the outcome of a device probe: the device if it came up, the CPU
    /// otherwise.
    pub fn probe_from(outcome: Result<Device, DeviceError>) -> Backend {
        match outcome {
            Ok(device) => Backend::with_device(device),
            Err(err) => {
                debug!("device unavailable: {}", err);
                Backend::cpu()
            },
        }
    }

    /// Selects a backend according to `config`.
    pub fn from_config(config: &BackendConfig) -> Backend {
        let backend = match config.preference {
            Preference::Cpu => Backend::cpu(),
            Preference::Auto => Backend::probe(config.threads),
            Preference::Device => {
                let backend = Backend::probe(config.threads);
                if !backend.is_accelerated() {
                    warn!("device backend requested but unavailable; using the CPU");
                }
                backend
            },
        };
        info!("{}", backend.info());
        backend
    }

    /// Returns the process-wide backend, probed with default settings on first use.
    pub fn global() -> &'static Backend {
        &GLOBAL
    }

    /// Returns `true` if a device is active
    pub fn is_accelerated(&self) -> bool {
        match self.runtime {
            Runtime::Device(_) => true,
            Runtime::Host => false,
        }
    }

    /// Returns the runtime
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Returns the single-position engine
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Returns native batch kernels for `op`, if the active engine has them and a device is
    /// active.
    pub fn batch_kernels(&self, op: BatchOp) -> Option<&dyn BatchKernels> {
        if !self.is_accelerated() {
            return None;
        }
        self.engine.batch_kernels().filter(|kernels| kernels.supports(op))
    }

    /// Returns `"device"` or `"CPU"`
    pub fn name(&self) -> &'static str {
        match self.runtime {
            Runtime::Device(_) => "device",
            Runtime::Host => "CPU",
        }
    }

    /// Returns a description of the backend, such as `Backend: device (8 workers)`.
    pub fn info(&self) -> String {
        match &self.runtime {
            Runtime::Device(device) => format!("Backend: device ({} workers)", device.workers()),
            Runtime::Host => "Backend: CPU".to_owned(),
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("runtime", &self.runtime)
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[cfg(test)]
mod backend_tests {
    use super::*;

    #[test]
    fn cpu_backend() {
        let backend = Backend::cpu();
        assert!(!backend.is_accelerated());
        assert_eq!(backend.name(), "CPU");
        assert_eq!(backend.info(), "Backend: CPU");
        assert_eq!(backend.engine().name(), "CPU");
        for &op in BatchOp::ALL.iter() {
            assert!(backend.batch_kernels(op).is_none());
        }
    }

    #[test]
    fn device_backend() {
        let backend = Backend::with_device(Device::open(3).expect("device"));
        assert!(backend.is_accelerated());
        assert_eq!(backend.name(), "device");
        assert_eq!(backend.info(), "Backend: device (3 workers)");
        assert_eq!(backend.engine().name(), "device");
        assert!(backend.batch_kernels(BatchOp::GenerateMoves).is_some());
        match backend.runtime() {
            Runtime::Device(device) => assert_eq!(device.workers(), 3),
            Runtime::Host => panic!("expected a device runtime"),
        }
    }

    #[test]
    fn cpu_preference_never_probes() {
        let config = BackendConfig { preference: Preference::Cpu, threads: 2 };
        assert!(!Backend::from_config(&config).is_accelerated());
    }

    #[test]
    fn probe_selects_a_working_backend() {
        let backend = Backend::probe(2);
        assert!(backend.is_accelerated());
        assert!(std::ptr::eq(Backend::global(), Backend::global()));
    }

    #[test]
    fn failed_probes_fall_back_to_the_cpu() {
        let outcomes = vec![
            Device::probe_with(2, |_| panic!("kernel fault")),
            Device::probe_with(2, |x| *x -= 1.0),
            Err(DeviceError::Pool("no threads".to_owned())),
        ];
        for outcome in outcomes {
            let backend = Backend::probe_from(outcome);
            assert!(!backend.is_accelerated());
            assert_eq!(backend.name(), "CPU");
            assert!(matches!(backend.runtime(), Runtime::Host));
            assert!(backend.batch_kernels(BatchOp::Evaluate).is_none());
        }
    }
}
