//! Lock-free telemetry (audio thread → UI)
//!
//! Single producer, any number of readers. The audio thread owns the
//! [`TelemetryWriter`]; readers hold cloneable [`TelemetryReader`] handles.
//! Only atomic loads and stores are involved, so a reader may see a
//! slightly stale or mid-wrap scope. That is acceptable for metering.

use std::sync::Arc;

use crossbeam_utils::CachePadded;
use portable_atomic::{AtomicF64, AtomicU64, AtomicUsize, Ordering};
use sat_core::{Sample, gain_to_db};

/// Default scope length in samples
pub const DEFAULT_SCOPE_CAPACITY: usize = 2048;

#[derive(Debug)]
struct Shared {
    /// Channel-0 output ring
    scope: Box<[AtomicF64]>,
    /// Total samples ever written to the scope
    write_index: CachePadded<AtomicUsize>,
    peak: AtomicF64,
    gain_reduction_db: AtomicF64,
    blocks: AtomicU64,
}

/// Create a connected writer / reader pair
pub fn telemetry_channel(capacity: usize) -> (TelemetryWriter, TelemetryReader) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        scope: (0..capacity).map(|_| AtomicF64::new(0.0)).collect(),
        write_index: CachePadded::new(AtomicUsize::new(0)),
        peak: AtomicF64::new(0.0),
        gain_reduction_db: AtomicF64::new(0.0),
        blocks: AtomicU64::new(0),
    });
    (
        TelemetryWriter {
            shared: Arc::clone(&shared),
            index: 0,
        },
        TelemetryReader { shared },
    )
}

/// Producer half, owned by the engine
#[derive(Debug)]
pub struct TelemetryWriter {
    shared: Arc<Shared>,
    /// Local copy of the write index (only this side mutates it)
    index: usize,
}

impl TelemetryWriter {
    /// Append output samples to the scope ring
    #[inline]
    pub fn push_scope(&mut self, samples: &[Sample]) {
        let scope = &self.shared.scope;
        let capacity = scope.len();
        for &x in samples {
            scope[self.index % capacity].store(x, Ordering::Relaxed);
            self.index = self.index.wrapping_add(1);
        }
        self.shared.write_index.store(self.index, Ordering::Release);
    }

    /// Publish the per-block scalars
    #[inline]
    pub fn publish(&self, peak: Sample, gain_reduction_db: f64) {
        self.shared.peak.store(peak, Ordering::Relaxed);
        self.shared
            .gain_reduction_db
            .store(gain_reduction_db, Ordering::Relaxed);
        self.shared.blocks.fetch_add(1, Ordering::Release);
    }

    /// Zero everything. Call from the non-real-time side only.
    pub fn clear(&mut self) {
        for slot in self.shared.scope.iter() {
            slot.store(0.0, Ordering::Relaxed);
        }
        self.index = 0;
        self.shared.write_index.store(0, Ordering::Release);
        self.shared.peak.store(0.0, Ordering::Relaxed);
        self.shared.gain_reduction_db.store(0.0, Ordering::Relaxed);
    }
}

/// Read-only view, callable from any thread at any rate
#[derive(Debug, Clone)]
pub struct TelemetryReader {
    shared: Arc<Shared>,
}

impl TelemetryReader {
    /// Peak magnitude of the last processed block (linear)
    #[inline]
    pub fn peak(&self) -> Sample {
        self.shared.peak.load(Ordering::Relaxed)
    }

    /// Peak of the last block in dBFS (-inf for silence)
    pub fn peak_db(&self) -> f64 {
        gain_to_db(self.peak())
    }

    /// Limiter gain reduction of the last block (positive dB)
    #[inline]
    pub fn gain_reduction_db(&self) -> f64 {
        self.shared.gain_reduction_db.load(Ordering::Relaxed)
    }

    /// Number of blocks processed since the engine was created
    #[inline]
    pub fn blocks(&self) -> u64 {
        self.shared.blocks.load(Ordering::Acquire)
    }

    /// Scope ring length
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.scope.len()
    }

    /// Copy the most recent scope samples into `out`, oldest first.
    ///
    /// Returns how many samples were written (bounded by `out.len()`, the
    /// capacity and the number of samples produced so far).
    pub fn copy_recent(&self, out: &mut [Sample]) -> usize {
        let scope = &self.shared.scope;
        let capacity = scope.len();
        let written = self.shared.write_index.load(Ordering::Acquire);
        let count = out.len().min(capacity).min(written);
        let start = written.wrapping_sub(count);
        for (i, o) in out[..count].iter_mut().enumerate() {
            *o = scope[start.wrapping_add(i) % capacity].load(Ordering::Relaxed);
        }
        count
    }
}
