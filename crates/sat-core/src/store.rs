//! Lock-free parameter store
//!
//! Written by the UI / automation thread, read by the audio thread once per
//! block through [`ParameterStore::snapshot`]. All access is relaxed atomic
//! loads and stores; nothing here allocates after construction.

use crate::params::{AtomicParam, ParamId};
use crate::snapshot::ParameterSnapshot;
use crate::{SatError, SatResult};

/// One atomic slot per [`ParamId`]
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicParam; ParamId::COUNT],
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicParam::new(ParamId::ALL[i].range().default)),
        }
    }

    /// Create a store holding the values of `snapshot`
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let store = Self::new();
        store.apply_snapshot(snapshot);
        store
    }

    /// Set a plain value, clamped to the parameter's range
    #[inline]
    pub fn set(&self, id: ParamId, value: f64) {
        self.values[id.index()].set(id.range().clamp(value));
    }

    /// Set from a normalized 0..1 value (host automation)
    #[inline]
    pub fn set_normalized(&self, id: ParamId, normalized: f64) {
        let range = id.range();
        self.values[id.index()].set(range.clamp(range.denormalize(normalized)));
    }

    /// Set by automation key (e.g. `"drive"`)
    pub fn set_by_key(&self, key: &str, value: f64) -> SatResult<()> {
        let id = ParamId::from_key(key)
            .ok_or_else(|| SatError::InvalidParam(format!("unknown parameter key '{key}'")))?;
        self.set(id, value);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f64 {
        self.values[id.index()].get()
    }

    #[inline]
    pub fn get_normalized(&self, id: ParamId) -> f64 {
        id.range().normalize(self.get(id))
    }

    /// Reset every parameter to its default
    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.values[id.index()].set(id.range().default);
        }
    }

    /// Store every field of `snapshot` (e.g. when restoring a preset)
    pub fn apply_snapshot(&self, snapshot: &ParameterSnapshot) {
        for id in ParamId::ALL {
            self.set(id, snapshot.get(id));
        }
    }

    /// Read a consistent-per-field view for one block. Real-time safe.
    #[inline]
    pub fn snapshot(&self) -> ParameterSnapshot {
        let mut snap = ParameterSnapshot::default();
        for id in ParamId::ALL {
            snap.set(id, self.values[id.index()].get());
        }
        snap
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
