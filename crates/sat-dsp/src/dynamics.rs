//! Brick-wall safety limiter
//!
//! Zero-latency peak limiter used as the last stage of the chain. Gain is
//! linked across channels (computed from the frame peak), attack is
//! instant and release is exponential. A final clamp guarantees no sample
//! leaves above the ceiling.

use sat_core::{Sample, db_to_gain, gain_to_db};

use crate::{Processor, ProcessorConfig};

/// Default ceiling (dBFS)
pub const DEFAULT_THRESHOLD_DB: f64 = -0.3;
/// Default release time (ms)
pub const DEFAULT_RELEASE_MS: f64 = 100.0;

/// Stereo-linked brick-wall limiter
#[derive(Debug, Clone)]
pub struct SafetyLimiter {
    threshold: f64,
    release_coeff: f64,
    gain: f64,
    /// Deepest gain reached during the last block
    block_min_gain: f64,
}

impl SafetyLimiter {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            threshold: db_to_gain(DEFAULT_THRESHOLD_DB),
            release_coeff: Self::release_coeff(sample_rate),
            gain: 1.0,
            block_min_gain: 1.0,
        }
    }

    fn release_coeff(sample_rate: f64) -> f64 {
        (-1.0 / (DEFAULT_RELEASE_MS * 0.001 * sample_rate)).exp()
    }

    /// Output ceiling (linear)
    #[inline]
    pub fn ceiling(&self) -> f64 {
        self.threshold
    }

    /// Current gain (linear)
    #[inline]
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Deepest gain reduction of the last processed block, in positive dB
    pub fn gain_reduction_db(&self) -> f64 {
        (-gain_to_db(self.block_min_gain)).max(0.0)
    }

    /// Advance the envelope by one frame and return the gain to apply
    #[inline(always)]
    pub fn next_gain(&mut self, frame_peak: f64) -> f64 {
        let target = if frame_peak > self.threshold {
            self.threshold / frame_peak
        } else {
            1.0
        };

        if target < self.gain {
            self.gain = target;
        } else {
            self.gain = target + self.release_coeff * (self.gain - target);
        }
        self.block_min_gain = self.block_min_gain.min(self.gain);
        self.gain
    }

    /// Limit the first `len` frames of `channels` in place.
    ///
    /// Non-finite samples are muted rather than passed on.
    pub fn process<C: AsMut<[Sample]>>(&mut self, channels: &mut [C], len: usize) {
        self.block_min_gain = 1.0;
        let ceiling = self.threshold;

        for i in 0..len {
            // Non-finite samples are muted below, so they must not drive the envelope
            let peak = channels.iter_mut().fold(0.0_f64, |peak, ch| {
                let x = ch.as_mut()[i];
                if x.is_finite() { peak.max(x.abs()) } else { peak }
            });
            let gain = self.next_gain(peak);

            for ch in channels.iter_mut() {
                let x = &mut ch.as_mut()[i];
                let y = *x * gain;
                *x = if y.is_finite() { y.clamp(-ceiling, ceiling) } else { 0.0 };
            }
        }
    }
}

impl Processor for SafetyLimiter {
    fn reset(&mut self) {
        self.gain = 1.0;
        self.block_min_gain = 1.0;
    }
}

impl ProcessorConfig for SafetyLimiter {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.release_coeff = Self::release_coeff(sample_rate);
    }
}
