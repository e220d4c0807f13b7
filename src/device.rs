//! A data-parallel compute device backed by a dedicated worker pool.
//!
//! Device arrays live apart from host data and are only read back through
//! [`DeviceArray::to_host`]. A kernel is a function of its grid index; [`Device::launch`] runs one
//! logical worker per index. Every launch returns after all of its workers finished, so reading
//! results back never observes unfinished work.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::mem;
use std::ops;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Reasons a device could not be brought up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The worker pool could not be created
    Pool(String),
    /// The probe round trip returned wrong values
    Verification,
    /// A worker panicked during the probe
    Panicked,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Pool(msg) => write!(f, "unable to start device workers: {}", msg),
            DeviceError::Verification => "device probe returned wrong values".fmt(f),
            DeviceError::Panicked => "device probe panicked".fmt(f),
        }
    }
}

impl std::error::Error for DeviceError { }

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An array in device memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceArray<T> {
    data: Vec<T>,
}

impl<T: Clone> DeviceArray<T> {
    /// Copies the array back into host memory
    pub fn to_host(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Copies the array into `dst`, which must have the same length
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn copy_to_host(&self, dst: &mut [T]) {
        dst.clone_from_slice(&self.data);
    }
}

impl<T> DeviceArray<T> {
    /// Moves the array back into host memory
    pub fn into_host(self) -> Vec<T> {
        self.data
    }
}

impl<T> ops::Deref for DeviceArray<T> {
    type Target = [T];

    /// Device-side view, for use inside kernels
    fn deref(&self) -> &[T] {
        &self.data
    }
}

/// A device array of flags that any number of workers may set concurrently.
///
/// Workers only ever write `true`, so redundant writes to the same element need no ordering.
#[derive(Debug)]
pub struct DeviceMask {
    flags: Vec<AtomicBool>,
}

impl DeviceMask {
    /// Sets element `index`
    pub fn set(&self, index: usize) {
        self.flags[index].store(true, Ordering::Relaxed);
    }

    /// Returns the number of elements
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns `true` if the mask has no elements
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Copies the mask back into host memory
    pub fn to_host(&self) -> Vec<bool> {
        self.flags.iter().map(|flag| flag.load(Ordering::Relaxed)).collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The compute device.
pub struct Device {
    pool: ThreadPool,
}

impl Device {
    /// Starts a device with `threads` workers, or one per logical CPU if `threads` is 0.
    pub fn open(threads: usize) -> Result<Device, DeviceError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("bishopforge-device-{}", i))
            .build()
            .map_err(|err| DeviceError::Pool(err.to_string()))?;

        Ok(Device { pool })
    }

    /// Starts a device and checks it with a small allocate, compute and read-back round trip.
    pub fn probe(threads: usize) -> Result<Device, DeviceError> {
        Device::probe_with(threads, |x| *x += 1.0)
    }

    /// Like [`Device::probe`], with `kernel` as the compute step. Each of four zeroed elements is
    /// passed to `kernel`, which must leave it at 1.
    pub fn probe_with<F>(threads: usize, kernel: F) -> Result<Device, DeviceError>
        where F: Fn(&mut f32) + Sync + Send
    {
        let device = Device::open(threads)?;

        let values = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut scratch = device.zeros::<f32>(4);
            device.launch_chunks(&mut scratch, 1, |_, x| kernel(&mut x[0]));
            scratch.to_host()
        })).map_err(|_| DeviceError::Panicked)?;

        if values.len() != 4 || values.iter().any(|&x| (x - 1.0).abs() > f32::EPSILON) {
            return Err(DeviceError::Verification);
        }

        debug!("device probe passed with {} workers", device.workers());
        Ok(device)
    }

    /// Returns the number of workers
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Copies host data into a new device array
    pub fn upload<T: Clone>(&self, host: &[T]) -> DeviceArray<T> {
        DeviceArray { data: host.to_vec() }
    }

    /// Allocates a device array of `len` default values
    pub fn zeros<T: Clone + Default>(&self, len: usize) -> DeviceArray<T> {
        DeviceArray { data: vec![T::default(); len] }
    }

    /// Allocates a cleared mask of `len` flags
    pub fn mask(&self, len: usize) -> DeviceMask {
        DeviceMask { flags: (0..len).map(|_| AtomicBool::new(false)).collect() }
    }

    /// Runs `kernel` once for every index in `0..grid`.
    pub fn launch<F>(&self, grid: usize, kernel: F) where F: Fn(usize) + Sync + Send {
        self.pool.install(|| (0..grid).into_par_iter().for_each(&kernel));
    }

    /// Runs `kernel` once per `chunk`-sized piece of `array`, passing the piece's index.
    pub fn launch_chunks<T, F>(&self, array: &mut DeviceArray<T>, chunk: usize, kernel: F)
        where T: Send, F: Fn(usize, &mut [T]) + Sync + Send
    {
        let data = &mut array.data;
        self.pool.install(|| {
            data.par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(i, piece)| kernel(i, piece));
        });
    }

    /// Runs `kernel` once per fixed-size region of `regions`. The value the kernel returns is
    /// stored in the matching element of `counts`.
    pub fn launch_regions<T, F>(
        &self,
        regions: &mut DeviceArray<T>,
        region_len: usize,
        counts: &mut DeviceArray<usize>,
        kernel: F,
    ) where T: Send, F: Fn(usize, &mut [T]) -> usize + Sync + Send {
        let data = &mut regions.data;
        let counts = &mut counts.data;
        self.pool.install(|| {
            data.par_chunks_mut(region_len)
                .zip(counts.par_iter_mut())
                .enumerate()
                .for_each(|(i, (region, count))| *count = kernel(i, region));
        });
    }

    /// Runs `kernel` once per segment of `array`. Segment `i` starts at `offsets[i]` and ends at
    /// the next offset, the last one at the end of the array.
    ///
    /// # Panics
    ///
    /// Panics if the offsets are not ascending or exceed the array.
    pub fn launch_segments<T, F>(&self, array: &mut DeviceArray<T>, offsets: &[usize], kernel: F)
        where T: Send, F: Fn(usize, &mut [T]) + Sync + Send
    {
        let len = array.data.len();
        let mut rest: &mut [T] = &mut array.data;
        let mut segments = Vec::with_capacity(offsets.len());
        for (i, &start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(len);
            let (segment, tail) = mem::take(&mut rest).split_at_mut(end - start);
            segments.push(segment);
            rest = tail;
        }

        self.pool.install(|| {
            segments.into_par_iter()
                .enumerate()
                .for_each(|(i, segment)| kernel(i, segment));
        });
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("workers", &self.workers()).finish()
    }
}
