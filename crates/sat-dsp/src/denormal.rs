//! Denormal protection
//!
//! Subnormal floats make filter feedback paths crawl on x86. The engine
//! enables FTZ/DAZ for the duration of each block and filters flush their
//! own state as a second line.

const DENORMAL_THRESHOLD: f64 = 1e-30;

/// Flush tiny values to zero
#[inline(always)]
pub fn flush_denormal(x: f64) -> f64 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Sets FTZ + DAZ for the current thread, restores the previous mode on drop
pub struct ScopedFlushDenormals {
    #[cfg(target_arch = "x86_64")]
    previous: u32,
}

#[cfg(target_arch = "x86_64")]
#[allow(deprecated)]
impl ScopedFlushDenormals {
    // DAZ (Denormals Are Zero) = bit 6, FTZ (Flush To Zero) = bit 15
    const FLAGS: u32 = 0x8040;

    #[inline]
    pub fn new() -> Self {
        use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};
        // Safety: only alters floating-point rounding/denormal behaviour of this thread
        let previous = unsafe { _mm_getcsr() };
        unsafe { _mm_setcsr(previous | Self::FLAGS) };
        Self { previous }
    }
}

#[cfg(target_arch = "x86_64")]
#[allow(deprecated)]
impl Drop for ScopedFlushDenormals {
    #[inline]
    fn drop(&mut self) {
        use std::arch::x86_64::_mm_setcsr;
        // Safety: restores the value read in `new`
        unsafe { _mm_setcsr(self.previous) };
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl ScopedFlushDenormals {
    // ARM flushes via FPCR.FZ, which Rust does not expose on stable
    #[inline]
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ScopedFlushDenormals {
    fn default() -> Self {
        Self::new()
    }
}
