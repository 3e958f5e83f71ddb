//! Oversampled saturation stage
//!
//! Drive gain and the waveshaper bank run inside the oversampler, so the
//! harmonics a curve generates above the base-rate Nyquist are filtered
//! out on the way down.
//!
//! ## Usage
//! ```ignore
//! let mut sat = OversampledShaper::new(OversampleFactor::X4, DEFAULT_SEED);
//! sat.prepare(512);
//! sat.process(&mut channel, &ShaperSettings::from_snapshot(&snapshot));
//! ```

use sat_core::{OversampleFactor, ParameterSnapshot, Sample};

use crate::Processor;
use crate::oversampling::Oversampler;
use crate::waveshaper::WaveshaperBank;

/// Shaper controls for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaperSettings {
    /// Linear drive gain applied before the curve
    pub drive: f64,
    pub waveshape: usize,
    /// Curve morph (0..1), passed through unchanged
    pub shape: f64,
}

impl ShaperSettings {
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        Self {
            drive: snapshot.drive_gain(),
            waveshape: snapshot.waveshape,
            shape: snapshot.shape,
        }
    }
}

impl Default for ShaperSettings {
    fn default() -> Self {
        Self::from_snapshot(&ParameterSnapshot::default())
    }
}

/// Per-channel drive + waveshaper inside a half-band oversampler
#[derive(Debug, Clone)]
pub struct OversampledShaper {
    oversampler: Oversampler,
    bank: WaveshaperBank,
}

impl OversampledShaper {
    pub fn new(factor: OversampleFactor, seed: u32) -> Self {
        Self {
            oversampler: Oversampler::new(factor),
            bank: WaveshaperBank::with_seed(seed),
        }
    }

    /// Size the oversampler for `max_block` base-rate samples
    pub fn prepare(&mut self, max_block: usize) {
        self.oversampler.prepare(max_block);
        self.bank.reset();
    }

    #[inline]
    pub fn factor(&self) -> OversampleFactor {
        self.oversampler.factor()
    }

    /// Saturate `block` in place
    pub fn process(&mut self, block: &mut [Sample], settings: &ShaperSettings) {
        let bank = &mut self.bank;
        let ShaperSettings {
            drive,
            waveshape,
            shape,
        } = *settings;

        self.oversampler.process(block, |up| {
            for x in up.iter_mut() {
                *x = bank.process(*x * drive, waveshape, shape);
            }
        });
    }
}

impl Processor for OversampledShaper {
    fn reset(&mut self) {
        self.oversampler.reset();
        self.bank.reset();
    }

    fn latency(&self) -> usize {
        self.oversampler.latency()
    }
}
