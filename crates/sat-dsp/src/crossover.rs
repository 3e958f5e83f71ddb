//! Three-band crossover built from Linkwitz-Riley filters
//!
//! Each filter is a 24 dB/oct Linkwitz-Riley section (two cascaded
//! Butterworth biquads). The low and high bands, which get recolored, come
//! straight out of a real filter. The paths left untouched are taken as
//! complements, so the three bands always sum back to the input:
//!
//! ```text
//! input ─┬─ LP(f_low) ─────────────────────────── low
//!        └─ upper = input − low ─┬─ HP(f_high) ─── high
//!                                └─ upper − high ─ mid
//! ```
//!
//! With both bands untouched, `low + mid + high == input` to rounding error.

use sat_core::Sample;

use crate::biquad::{BUTTERWORTH_Q, BiquadCoeffs, BiquadTDF2};
use crate::{MonoProcessor, Processor, ProcessorConfig};

/// Default low crossover (Hz)
pub const DEFAULT_LOW_FREQ: f64 = 150.0;
/// Default high crossover (Hz)
pub const DEFAULT_HIGH_FREQ: f64 = 5000.0;

/// Filter response of a Linkwitz-Riley section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverKind {
    Lowpass,
    Highpass,
}

impl CrossoverKind {
    fn coeffs(self, frequency: f64, sample_rate: f64) -> BiquadCoeffs {
        match self {
            Self::Lowpass => BiquadCoeffs::lowpass(frequency, BUTTERWORTH_Q, sample_rate),
            Self::Highpass => BiquadCoeffs::highpass(frequency, BUTTERWORTH_Q, sample_rate),
        }
    }
}

/// 4th-order Linkwitz-Riley filter (LR24)
#[derive(Debug, Clone)]
pub struct LinkwitzRileyFilter {
    kind: CrossoverKind,
    stages: [BiquadTDF2; 2],
    frequency: f64,
    sample_rate: f64,
}

impl LinkwitzRileyFilter {
    pub fn new(kind: CrossoverKind, frequency: f64, sample_rate: f64) -> Self {
        let coeffs = kind.coeffs(frequency, sample_rate);
        Self {
            kind,
            stages: [BiquadTDF2::new(coeffs), BiquadTDF2::new(coeffs)],
            frequency,
            sample_rate,
        }
    }

    pub fn lowpass(frequency: f64, sample_rate: f64) -> Self {
        Self::new(CrossoverKind::Lowpass, frequency, sample_rate)
    }

    pub fn highpass(frequency: f64, sample_rate: f64) -> Self {
        Self::new(CrossoverKind::Highpass, frequency, sample_rate)
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Recompute coefficients; delay memory is kept
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.update_coeffs();
    }

    fn update_coeffs(&mut self) {
        let coeffs = self.kind.coeffs(self.frequency, self.sample_rate);
        for stage in &mut self.stages {
            stage.set_coeffs(coeffs);
        }
    }
}

impl Processor for LinkwitzRileyFilter {
    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

impl MonoProcessor for LinkwitzRileyFilter {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let [first, second] = &mut self.stages;
        second.process_sample(first.process_sample(input))
    }
}

impl ProcessorConfig for LinkwitzRileyFilter {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_coeffs();
    }
}

/// Per-channel low / mid / high splitter
///
/// Coefficients are only recomputed when a cutoff or the sample rate
/// actually changes; filter memory survives every update.
#[derive(Debug, Clone)]
pub struct CrossoverSplitter {
    low: LinkwitzRileyFilter,
    high: LinkwitzRileyFilter,
    sample_rate: f64,
}

impl CrossoverSplitter {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_frequencies(DEFAULT_LOW_FREQ, DEFAULT_HIGH_FREQ, sample_rate)
    }

    pub fn with_frequencies(low_freq: f64, high_freq: f64, sample_rate: f64) -> Self {
        Self {
            low: LinkwitzRileyFilter::lowpass(low_freq, sample_rate),
            high: LinkwitzRileyFilter::highpass(high_freq, sample_rate),
            sample_rate,
        }
    }

    #[inline]
    pub fn frequencies(&self) -> (f64, f64) {
        (self.low.frequency(), self.high.frequency())
    }

    /// Update cutoffs if they differ from the current ones.
    ///
    /// Returns `true` when coefficients were recomputed.
    pub fn update(&mut self, low_freq: f64, high_freq: f64) -> bool {
        let mut changed = false;
        if low_freq != self.low.frequency() {
            self.low.set_frequency(low_freq);
            changed = true;
        }
        if high_freq != self.high.frequency() {
            self.high.set_frequency(high_freq);
            changed = true;
        }
        changed
    }

    /// Split one sample into (low, mid, high)
    #[inline(always)]
    pub fn split_sample(&mut self, input: Sample) -> (Sample, Sample, Sample) {
        let low = self.low.process_sample(input);
        let upper = input - low;
        let high = self.high.process_sample(upper);
        (low, upper - high, high)
    }

    /// Split a block. All slices must have the same length.
    pub fn split_block(
        &mut self,
        input: &[Sample],
        low: &mut [Sample],
        mid: &mut [Sample],
        high: &mut [Sample],
    ) {
        debug_assert!(low.len() >= input.len());
        debug_assert!(mid.len() >= input.len());
        debug_assert!(high.len() >= input.len());

        for (i, &x) in input.iter().enumerate() {
            let (l, m, h) = self.split_sample(x);
            low[i] = l;
            mid[i] = m;
            high[i] = h;
        }
    }
}

impl Processor for CrossoverSplitter {
    fn reset(&mut self) {
        self.low.reset();
        self.high.reset();
    }
}

impl ProcessorConfig for CrossoverSplitter {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.low.set_sample_rate(sample_rate);
        self.high.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SR: f64 = 48000.0;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / SR).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|s| s * s).sum::<f64>() / x.len() as f64).sqrt()
    }

    /// Split a steady tone and return the RMS of (input, low, mid, high)
    /// over the settled second half
    fn band_rms(split: &mut CrossoverSplitter, freq: f64) -> (f64, f64, f64, f64) {
        let len = 48000;
        let input = sine(freq, len);
        let (mut low, mut mid, mut high) = (vec![0.0; len], vec![0.0; len], vec![0.0; len]);
        split.split_block(&input, &mut low, &mut mid, &mut high);
        let tail = len / 2;
        (
            rms(&input[tail..]),
            rms(&low[tail..]),
            rms(&mid[tail..]),
            rms(&high[tail..]),
        )
    }

    #[test]
    fn test_lr_pair_sums_flat() {
        // LP + HP of a Linkwitz-Riley pair is an allpass: flat magnitude
        for freq in [100.0, 500.0, 2000.0] {
            let mut lp = LinkwitzRileyFilter::lowpass(500.0, SR);
            let mut hp = LinkwitzRileyFilter::highpass(500.0, SR);
            let input = sine(freq, 48000);
            let sum: Vec<f64> = input
                .iter()
                .map(|&x| lp.process_sample(x) + hp.process_sample(x))
                .collect();
            let ratio = rms(&sum[24000..]) / rms(&input[24000..]);
            assert!((ratio - 1.0).abs() < 1e-3, "{} Hz: {}", freq, ratio);
        }
    }

    #[test]
    fn test_lr_minus_6db_at_cutoff() {
        let input = sine(1000.0, 48000);
        for kind in [CrossoverKind::Lowpass, CrossoverKind::Highpass] {
            let mut filter = LinkwitzRileyFilter::new(kind, 1000.0, SR);
            let output: Vec<f64> = input.iter().map(|&x| filter.process_sample(x)).collect();
            let ratio = rms(&output[24000..]) / rms(&input[24000..]);
            assert!((ratio - 0.5).abs() < 0.01, "{:?}: {}", kind, ratio);
        }
    }

    #[test]
    fn test_reconstruction() {
        for &(low, high) in &[(20.0, 1000.0), (150.0, 5000.0), (1000.0, 1000.0), (800.0, 20000.0)] {
            let mut split = CrossoverSplitter::with_frequencies(low, high, SR);
            let input: Vec<f64> = sine(60.0, 4096)
                .iter()
                .zip(sine(3100.0, 4096))
                .map(|(a, b)| 0.5 * a + 0.4 * b)
                .collect();
            for &x in &input {
                let (l, m, h) = split.split_sample(x);
                assert!((l + m + h - x).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_band_separation() {
        let mut split = CrossoverSplitter::with_frequencies(200.0, 4000.0, SR);
        // A 10 kHz tone lands in the high band, the low band rejects it
        let (input, low, _, high) = band_rms(&mut split, 10_000.0);
        assert!(high > 0.95 * input);
        assert!(low < 1e-3);
    }

    #[test]
    fn test_high_band_rejects_content_below_cutoff() {
        let mut split = CrossoverSplitter::with_frequencies(150.0, 5000.0, SR);
        let (input, _, _, high) = band_rms(&mut split, 500.0);
        // better than -40 dB
        assert!(high < 0.01 * input, "high band {} vs {}", high, input);
    }

    #[test]
    fn test_mid_band_carries_mid_content() {
        let mut split = CrossoverSplitter::with_frequencies(150.0, 5000.0, SR);
        let (input, low, mid, high) = band_rms(&mut split, 1000.0);
        assert!((mid / input - 1.0).abs() < 0.02);
        assert!(low < 0.01 * input);
        assert!(high < 0.01 * input);
    }

    #[test]
    fn test_update_only_on_change() {
        let mut split = CrossoverSplitter::new(SR);
        assert!(!split.update(DEFAULT_LOW_FREQ, DEFAULT_HIGH_FREQ));
        assert!(split.update(300.0, DEFAULT_HIGH_FREQ));
        assert!(!split.update(300.0, DEFAULT_HIGH_FREQ));
        assert!(split.update(300.0, 9000.0));
        assert_eq!(split.frequencies(), (300.0, 9000.0));
    }

    #[test]
    fn test_reconstruction_survives_cutoff_changes() {
        let mut split = CrossoverSplitter::new(SR);
        let input = sine(700.0, 4096);
        for (i, &x) in input.iter().enumerate() {
            if i % 256 == 0 {
                split.update(100.0 + i as f64 * 0.1, 2000.0 + i as f64);
            }
            let (l, m, h) = split.split_sample(x);
            assert!((l + m + h - x).abs() < 1e-9);
        }
    }
}
