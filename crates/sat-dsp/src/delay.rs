//! Fixed integer delay line
//!
//! Used to align the dry path with the oversampler's group delay.

use sat_core::Sample;

use crate::{MonoProcessor, Processor};

/// Delays its input by a fixed number of samples
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<Sample>,
    pos: usize,
}

impl DelayLine {
    /// Allocates `delay` samples of history
    pub fn new(delay: usize) -> Self {
        Self {
            buffer: vec![0.0; delay],
            pos: 0,
        }
    }

    #[inline]
    pub fn delay(&self) -> usize {
        self.buffer.len()
    }
}

impl Processor for DelayLine {
    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }

    fn latency(&self) -> usize {
        self.buffer.len()
    }
}

impl MonoProcessor for DelayLine {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        if self.buffer.is_empty() {
            return input;
        }
        let out = self.buffer[self.pos];
        self.buffer[self.pos] = input;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }
        out
    }
}
