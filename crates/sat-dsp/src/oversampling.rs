//! Half-band polyphase oversampling
//!
//! 2x and 4x are built from cascaded 2x half-band FIR stages. Each stage
//! designs a Kaiser-windowed sinc prototype, splits it into its even and odd
//! polyphase branches and uses the same taps for interpolation and
//! decimation. The round trip has an integer group delay in base-rate
//! samples (see [`Oversampler::latency`]).
//!
//! All buffers are sized in [`Oversampler::prepare`]; `process` never
//! allocates.

use sat_core::{OversampleFactor, Sample};
use std::f64::consts::PI;

use crate::Processor;

/// Prototype lengths for the first (base ↔ 2x) and second (2x ↔ 4x) stage.
/// Centers are 31 and 16, so the 4x round trip delays by 31 + 16/2 samples.
const STAGE_TAPS: [usize; 2] = [63, 33];

/// Stopband attenuation the Kaiser window is designed for
const STOPBAND_ATTEN_DB: f64 = 96.0;

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER DESIGN
// ═══════════════════════════════════════════════════════════════════════════════

/// Kaiser beta for a given stopband attenuation
fn kaiser_beta(atten_db: f64) -> f64 {
    if atten_db > 50.0 {
        0.1102 * (atten_db - 8.7)
    } else if atten_db >= 21.0 {
        0.5842 * (atten_db - 21.0).powf(0.4) + 0.07886 * (atten_db - 21.0)
    } else {
        0.0
    }
}

/// Modified Bessel function of the first kind, order zero (power series)
fn bessel_i0(x: f64) -> f64 {
    let half = x * 0.5;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..64 {
        term *= (half / k as f64) * (half / k as f64);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

/// Half-band lowpass prototype (cutoff at a quarter of the high rate).
///
/// Taps at an even distance from the center are exactly zero; each
/// polyphase branch is normalized to sum to 0.5, so the decimator has unity
/// DC gain and the interpolator (which doubles its taps) does too.
fn design_half_band(num_taps: usize, atten_db: f64) -> (Vec<f64>, Vec<f64>) {
    debug_assert!(num_taps % 2 == 1);
    let center = (num_taps - 1) / 2;
    let beta = kaiser_beta(atten_db);
    let i0_beta = bessel_i0(beta);

    let prototype: Vec<f64> = (0..num_taps)
        .map(|n| {
            let offset = n as isize - center as isize;
            if offset == 0 {
                return 0.5;
            }
            if offset % 2 == 0 {
                return 0.0;
            }
            let t = 0.5 * offset as f64;
            let sinc = (PI * t).sin() / (PI * t);
            let ratio = offset as f64 / center as f64;
            let window = bessel_i0(beta * (1.0 - ratio * ratio).max(0.0).sqrt()) / i0_beta;
            0.5 * sinc * window
        })
        .collect();

    let mut even: Vec<f64> = prototype.iter().step_by(2).copied().collect();
    let mut odd: Vec<f64> = prototype.iter().skip(1).step_by(2).copied().collect();
    for branch in [&mut even, &mut odd] {
        let sum: f64 = branch.iter().sum();
        if sum.abs() > 1e-12 {
            let scale = 0.5 / sum;
            branch.iter_mut().for_each(|c| *c *= scale);
        }
    }
    (even, odd)
}

// ═══════════════════════════════════════════════════════════════════════════════
// HISTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed circular history; `get(0)` is the newest sample
#[derive(Debug, Clone)]
struct History {
    buf: Box<[f64]>,
    pos: usize,
}

impl History {
    fn new(len: usize) -> Self {
        Self {
            buf: vec![0.0; len.max(1)].into_boxed_slice(),
            pos: 0,
        }
    }

    #[inline(always)]
    fn push(&mut self, x: f64) {
        self.pos = (self.pos + 1) % self.buf.len();
        self.buf[self.pos] = x;
    }

    #[inline(always)]
    fn dot(&self, taps: &[f64]) -> f64 {
        let len = self.buf.len();
        taps.iter()
            .enumerate()
            .map(|(k, &c)| c * self.buf[(self.pos + len - k) % len])
            .sum()
    }

    fn clear(&mut self) {
        self.buf.fill(0.0);
        self.pos = 0;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HALF-BAND STAGE
// ═══════════════════════════════════════════════════════════════════════════════

/// One 2x interpolate / decimate pair
#[derive(Debug, Clone)]
pub struct HalfBandStage {
    even: Box<[f64]>,
    odd: Box<[f64]>,
    center: usize,
    up: History,
    down_even: History,
    down_odd: History,
}

impl HalfBandStage {
    pub fn new(num_taps: usize) -> Self {
        let (even, odd) = design_half_band(num_taps, STOPBAND_ATTEN_DB);
        Self {
            up: History::new(even.len().max(odd.len())),
            down_even: History::new(even.len()),
            down_odd: History::new(odd.len()),
            even: even.into_boxed_slice(),
            odd: odd.into_boxed_slice(),
            center: (num_taps - 1) / 2,
        }
    }

    /// Group delay of the prototype in samples at this stage's high rate
    #[inline]
    pub fn center(&self) -> usize {
        self.center
    }

    /// One input sample in, two output samples out
    #[inline]
    pub fn interpolate(&mut self, input: Sample) -> (Sample, Sample) {
        self.up.push(input);
        (2.0 * self.up.dot(&self.even), 2.0 * self.up.dot(&self.odd))
    }

    /// Two input samples in, one output sample out
    #[inline]
    pub fn decimate(&mut self, first: Sample, second: Sample) -> Sample {
        self.down_even.push(first);
        let y = self.down_even.dot(&self.even) + self.down_odd.dot(&self.odd);
        self.down_odd.push(second);
        y
    }

    pub fn reset(&mut self) {
        self.up.clear();
        self.down_even.clear();
        self.down_odd.clear();
    }
}

fn interpolate_into(stage: &mut HalfBandStage, src: &[Sample], dst: &mut [Sample]) {
    for (i, &x) in src.iter().enumerate() {
        let (a, b) = stage.interpolate(x);
        dst[2 * i] = a;
        dst[2 * i + 1] = b;
    }
}

fn decimate_into(stage: &mut HalfBandStage, src: &[Sample], dst: &mut [Sample]) {
    for (i, out) in dst.iter_mut().enumerate() {
        *out = stage.decimate(src[2 * i], src[2 * i + 1]);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OVERSAMPLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Single-channel upsample → process → downsample wrapper
#[derive(Debug, Clone)]
pub struct Oversampler {
    factor: OversampleFactor,
    stages: Vec<HalfBandStage>,
    /// 2x buffer
    buf_2x: Vec<Sample>,
    /// 4x buffer
    buf_4x: Vec<Sample>,
    max_block: usize,
}

impl Oversampler {
    pub fn new(factor: OversampleFactor) -> Self {
        let stages = STAGE_TAPS
            .iter()
            .take(factor.stages())
            .map(|&taps| HalfBandStage::new(taps))
            .collect();
        Self {
            factor,
            stages,
            buf_2x: Vec::new(),
            buf_4x: Vec::new(),
            max_block: 0,
        }
    }

    /// Size internal buffers for blocks up to `max_block` base-rate samples
    /// and clear filter state. Not real-time safe.
    pub fn prepare(&mut self, max_block: usize) {
        let stages = self.stages.len();
        self.max_block = max_block;
        self.buf_2x = vec![0.0; if stages >= 1 { max_block * 2 } else { 0 }];
        self.buf_4x = vec![0.0; if stages >= 2 { max_block * 4 } else { 0 }];
        self.reset();
        log::debug!(
            "oversampler {}x: {} half-band stage(s), latency {} samples, block {}",
            self.factor.factor(),
            stages,
            self.latency(),
            max_block
        );
    }

    #[inline]
    pub fn factor(&self) -> OversampleFactor {
        self.factor
    }

    /// Largest base-rate block handled in one pass
    #[inline]
    pub fn max_block(&self) -> usize {
        self.max_block
    }

    /// Round-trip delay in base-rate samples
    pub fn latency(&self) -> usize {
        self.stages
            .iter()
            .enumerate()
            .map(|(level, stage)| stage.center() >> level)
            .sum()
    }

    /// Run `f` over `block` at the oversampled rate.
    ///
    /// Blocks longer than the prepared size are handled in consecutive
    /// passes. Before `prepare` only the 1x path processes anything.
    pub fn process<F>(&mut self, block: &mut [Sample], mut f: F)
    where
        F: FnMut(&mut [Sample]),
    {
        if self.stages.is_empty() {
            f(block);
            return;
        }
        if self.max_block == 0 {
            return;
        }

        for chunk in block.chunks_mut(self.max_block) {
            let n = chunk.len();
            match self.stages.as_mut_slice() {
                [s0] => {
                    let up = &mut self.buf_2x[..2 * n];
                    interpolate_into(s0, chunk, up);
                    f(up);
                    decimate_into(s0, up, chunk);
                }
                [s0, s1, ..] => {
                    let mid = &mut self.buf_2x[..2 * n];
                    let up = &mut self.buf_4x[..4 * n];
                    interpolate_into(s0, chunk, mid);
                    interpolate_into(s1, mid, up);
                    f(up);
                    decimate_into(s1, up, mid);
                    decimate_into(s0, mid, chunk);
                }
                [] => f(chunk),
            }
        }
    }
}

impl Processor for Oversampler {
    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.buf_2x.fill(0.0);
        self.buf_4x.fill(0.0);
    }

    fn latency(&self) -> usize {
        Oversampler::latency(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin())
            .collect()
    }

    #[test]
    fn test_bessel_i0() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-15);
        assert!((bessel_i0(1.0) - 1.2660658777520082).abs() < 1e-12);
        assert!((bessel_i0(5.0) - 27.239871823604442).abs() < 1e-9);
    }

    #[test]
    fn test_half_band_branches() {
        for &taps in &STAGE_TAPS {
            let (even, odd) = design_half_band(taps, STOPBAND_ATTEN_DB);
            assert!((even.iter().sum::<f64>() - 0.5).abs() < 1e-12);
            assert!((odd.iter().sum::<f64>() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_latency() {
        assert_eq!(Oversampler::new(OversampleFactor::X1).latency(), 0);
        assert_eq!(Oversampler::new(OversampleFactor::X2).latency(), 31);
        assert_eq!(Oversampler::new(OversampleFactor::X4).latency(), 39);
    }

    #[test]
    fn test_x1_is_transparent() {
        let mut os = Oversampler::new(OversampleFactor::X1);
        os.prepare(64);
        let input = sine(440.0, 48000.0, 64);
        let mut buf = input.clone();
        os.process(&mut buf, |_| {});
        assert_eq!(buf, input);
    }

    #[test]
    fn test_callback_sees_oversampled_length() {
        for factor in [OversampleFactor::X1, OversampleFactor::X2, OversampleFactor::X4] {
            let mut os = Oversampler::new(factor);
            os.prepare(128);
            let mut buf = vec![0.0; 100];
            let mut seen = 0;
            os.process(&mut buf, |up| seen = up.len());
            assert_eq!(seen, 100 * factor.factor());
        }
    }

    #[test]
    fn test_dc_gain_is_unity() {
        for factor in [OversampleFactor::X2, OversampleFactor::X4] {
            let mut os = Oversampler::new(factor);
            os.prepare(256);
            let mut buf = vec![1.0; 256];
            os.process(&mut buf, |_| {});
            assert!((buf[255] - 1.0).abs() < 1e-9, "{:?}: {}", factor, buf[255]);
        }
    }

    #[test]
    fn test_round_trip_is_delayed_input() {
        let sr = 48000.0;
        for factor in [OversampleFactor::X2, OversampleFactor::X4] {
            let mut os = Oversampler::new(factor);
            os.prepare(512);
            let latency = os.latency();
            let input = sine(1000.0, sr, 2048);
            let mut output = input.clone();
            for block in output.chunks_mut(512) {
                os.process(block, |_| {});
            }
            for i in 200..2048 {
                let err = (output[i] - input[i - latency]).abs();
                assert!(err < 1e-3, "{:?} sample {}: error {}", factor, i, err);
            }
        }
    }

    #[test]
    fn test_long_block_is_chunked() {
        let mut chunked = Oversampler::new(OversampleFactor::X4);
        chunked.prepare(64);
        let mut whole = Oversampler::new(OversampleFactor::X4);
        whole.prepare(1024);

        let input = sine(3000.0, 48000.0, 1000);
        let mut a = input.clone();
        let mut b = input.clone();
        chunked.process(&mut a, |up| up.iter_mut().for_each(|x| *x = x.tanh()));
        whole.process(&mut b, |up| up.iter_mut().for_each(|x| *x = x.tanh()));
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut os = Oversampler::new(OversampleFactor::X4);
        os.prepare(64);
        let mut buf = vec![1.0; 64];
        os.process(&mut buf, |_| {});
        os.reset();
        let mut silence = vec![0.0; 64];
        os.process(&mut silence, |_| {});
        assert!(silence.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_unprepared_does_nothing() {
        let mut os = Oversampler::new(OversampleFactor::X2);
        let mut buf = vec![0.5; 16];
        os.process(&mut buf, |up| up.fill(9.0));
        assert_eq!(buf, vec![0.5; 16]);
    }
}
