//! Sample types and gain helpers

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Convert decibels to linear gain.
///
/// Values at or below -144 dB are treated as silence.
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    if db <= -144.0 {
        0.0
    } else {
        10.0_f64.powf(db / 20.0)
    }
}

/// Convert linear gain to decibels (-inf for non-positive gain)
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    if gain <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

/// Peak magnitude of a block
#[inline]
pub fn peak_of(block: &[Sample]) -> Sample {
    block.iter().fold(0.0, |peak, &s| peak.max(s.abs()))
}
