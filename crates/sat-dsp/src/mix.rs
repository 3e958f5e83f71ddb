//! Dry/wet mix, delta monitor and anti-click crossfade
//!
//! Per frame:
//! ```text
//! normal = dry·(1 − mix) + wet·mix
//! delta  = tanh((wet − dry) · deltaGain)
//! out    = normal·(1 − s) + delta·s
//! ```
//! where `s` ramps toward 1 (delta on) or 0 (delta off) by a fixed step per
//! frame, taking 10 ms for a full transition. Delta ignores `mix`.

use sat_core::{ParameterSnapshot, Sample};

use crate::{Processor, ProcessorConfig};

/// Full-scale delta crossfade duration
pub const DELTA_FADE_MS: f64 = 10.0;

/// Dry/wet blend
#[inline(always)]
pub fn blend(dry: Sample, wet: Sample, mix: f64) -> Sample {
    dry * (1.0 - mix) + wet * mix
}

/// Soft-clipped wet-minus-dry difference
#[inline(always)]
pub fn delta(dry: Sample, wet: Sample, gain: f64) -> Sample {
    ((wet - dry) * gain).tanh()
}

/// Mix controls for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixSettings {
    /// Wet proportion (0..1)
    pub mix: f64,
    pub delta_enabled: bool,
    /// Linear delta monitor gain
    pub delta_gain: f64,
}

impl MixSettings {
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        Self {
            mix: snapshot.mix_fraction(),
            delta_enabled: snapshot.delta_enabled,
            delta_gain: snapshot.delta_gain_linear(),
        }
    }
}

impl Default for MixSettings {
    fn default() -> Self {
        Self::from_snapshot(&ParameterSnapshot::default())
    }
}

/// Bounded-rate ramp between the normal and delta paths
#[derive(Debug, Clone)]
pub struct DeltaCrossfade {
    smoothed: f64,
    step: f64,
}

impl DeltaCrossfade {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            smoothed: 0.0,
            step: Self::step_for(sample_rate),
        }
    }

    fn step_for(sample_rate: f64) -> f64 {
        1.0 / (DELTA_FADE_MS * 0.001 * sample_rate).max(1.0)
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.smoothed
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Move one step toward the target and return the new position
    #[inline(always)]
    pub fn advance(&mut self, delta_enabled: bool) -> f64 {
        self.smoothed = if delta_enabled {
            (self.smoothed + self.step).min(1.0)
        } else {
            (self.smoothed - self.step).max(0.0)
        };
        self.smoothed
    }
}

impl Processor for DeltaCrossfade {
    fn reset(&mut self) {
        self.smoothed = 0.0;
    }
}

impl ProcessorConfig for DeltaCrossfade {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.step = Self::step_for(sample_rate);
    }
}

/// Combines dry and wet channels into the output, in place over `wet`
#[derive(Debug, Clone)]
pub struct MixEngine {
    crossfade: DeltaCrossfade,
}

impl MixEngine {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            crossfade: DeltaCrossfade::new(sample_rate),
        }
    }

    #[inline]
    pub fn crossfade(&self) -> &DeltaCrossfade {
        &self.crossfade
    }

    /// Mix the first `len` frames. The crossfade advances once per frame and
    /// is shared by every channel.
    pub fn process<D, W>(&mut self, dry: &[D], wet: &mut [W], len: usize, settings: &MixSettings)
    where
        D: AsRef<[Sample]>,
        W: AsMut<[Sample]>,
    {
        let MixSettings {
            mix,
            delta_enabled,
            delta_gain,
        } = *settings;

        for i in 0..len {
            let s = self.crossfade.advance(delta_enabled);
            for (d, w) in dry.iter().zip(wet.iter_mut()) {
                let d = d.as_ref()[i];
                let w = &mut w.as_mut()[i];
                *w = blend(d, *w, mix) * (1.0 - s) + delta(d, *w, delta_gain) * s;
            }
        }
    }
}

impl Processor for MixEngine {
    fn reset(&mut self) {
        self.crossfade.reset();
    }
}

impl ProcessorConfig for MixEngine {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.crossfade.set_sample_rate(sample_rate);
    }
}
