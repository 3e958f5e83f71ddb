//! Band coloration
//!
//! The low band gets a signed square term ("warmth", even harmonics), the
//! high band has a tanh-shaped component subtracted ("softness"). The mid
//! band is never touched. Bands are recombined by plain summation, so with
//! both bands disabled the output equals the crossover input.

use sat_core::{ParameterSnapshot, Sample};

use crate::crossover::CrossoverSplitter;
use crate::{Processor, ProcessorConfig};

/// Low-band warmth: `x + |x|·x·warmth`
#[inline(always)]
pub fn warmth(x: Sample, amount: f64) -> Sample {
    x + x.abs() * x * amount
}

/// High-band softening: `x - tanh(x·softness)`
#[inline(always)]
pub fn soften(x: Sample, amount: f64) -> Sample {
    x - (x * amount).tanh()
}

/// Band settings for one block, taken from the parameter snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSettings {
    pub low_enable: bool,
    pub low_freq: f64,
    pub low_warmth: f64,
    /// Linear gain
    pub low_level: f64,
    pub high_enable: bool,
    pub high_freq: f64,
    pub high_softness: f64,
    /// Linear gain
    pub high_level: f64,
}

impl BandSettings {
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        Self {
            low_enable: snapshot.low_enable,
            low_freq: snapshot.low_freq,
            low_warmth: snapshot.low_warmth,
            low_level: snapshot.low_level_gain(),
            high_enable: snapshot.high_enable,
            high_freq: snapshot.high_freq,
            high_softness: snapshot.high_softness,
            high_level: snapshot.high_level_gain(),
        }
    }
}

impl Default for BandSettings {
    fn default() -> Self {
        Self::from_snapshot(&ParameterSnapshot::default())
    }
}

/// Splits one channel, colors low/high in place and sums the bands back
#[derive(Debug, Clone)]
pub struct BandProcessor {
    splitter: CrossoverSplitter,
    low: Vec<Sample>,
    mid: Vec<Sample>,
    high: Vec<Sample>,
}

impl BandProcessor {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            splitter: CrossoverSplitter::new(sample_rate),
            low: Vec::new(),
            mid: Vec::new(),
            high: Vec::new(),
        }
    }

    /// Size the band buffers. Not real-time safe.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.splitter.set_sample_rate(sample_rate);
        self.low = vec![0.0; max_block_size];
        self.mid = vec![0.0; max_block_size];
        self.high = vec![0.0; max_block_size];
        self.splitter.reset();
    }

    /// Largest block `process` accepts
    #[inline]
    pub fn capacity(&self) -> usize {
        self.low.len()
    }

    /// Apply cutoffs; recomputes coefficients only when they changed
    #[inline]
    pub fn update(&mut self, settings: &BandSettings) -> bool {
        self.splitter.update(settings.low_freq, settings.high_freq)
    }

    /// Split, color and recombine `buffer` in place.
    ///
    /// `buffer` must not exceed [`capacity`](Self::capacity); the caller
    /// chunks longer blocks.
    pub fn process(&mut self, buffer: &mut [Sample], settings: &BandSettings) {
        let n = buffer.len().min(self.capacity());
        let (buffer, low, mid, high) = (
            &mut buffer[..n],
            &mut self.low[..n],
            &mut self.mid[..n],
            &mut self.high[..n],
        );

        self.splitter.split_block(buffer, low, mid, high);

        if settings.low_enable {
            for x in low.iter_mut() {
                *x = warmth(*x, settings.low_warmth) * settings.low_level;
            }
        }
        if settings.high_enable {
            for x in high.iter_mut() {
                *x = soften(*x, settings.high_softness) * settings.high_level;
            }
        }

        for (i, out) in buffer.iter_mut().enumerate() {
            *out = low[i] + mid[i] + high[i];
        }
    }
}

impl Processor for BandProcessor {
    fn reset(&mut self) {
        self.splitter.reset();
        self.low.fill(0.0);
        self.mid.fill(0.0);
        self.high.fill(0.0);
    }
}
