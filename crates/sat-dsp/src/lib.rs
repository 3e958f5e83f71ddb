//! sat-dsp: DSP building blocks for the saturation engine
//!
//! ## Modules
//! - `biquad` - TDF-II biquad filters (lowpass, highpass)
//! - `crossover` - Linkwitz-Riley matched pairs and the 3-band splitter
//! - `band` - Low warmth / high softness band coloration
//! - `waveshaper` - 58 stateless transfer functions plus seeded crackle noise
//! - `oversampling` - Half-band polyphase up/down sampling
//! - `saturation` - Drive + waveshaper running inside the oversampler
//! - `mix` - Dry/wet blend, delta monitor and anti-click crossfade
//! - `dynamics` - Brick-wall safety limiter
//! - `delay` - Fixed integer delay line (dry latency alignment)
//! - `denormal` - Flush-to-zero guard and helpers

pub mod band;
pub mod biquad;
pub mod crossover;
pub mod delay;
pub mod denormal;
pub mod dynamics;
pub mod mix;
pub mod oversampling;
pub mod saturation;
pub mod waveshaper;

use sat_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Processor configuration for sample rate changes
pub trait ProcessorConfig {
    fn set_sample_rate(&mut self, sample_rate: f64);
}
