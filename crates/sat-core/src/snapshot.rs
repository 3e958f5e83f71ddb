//! Per-block parameter snapshot
//!
//! The engine's only view of control state. Values are plain units (dB, Hz,
//! percent) and are read once at the start of a block.

use serde::{Deserialize, Serialize};

use crate::params::{ParamId, WAVESHAPE_COUNT};
use crate::sample::db_to_gain;
use crate::SatResult;

/// Consistent set of parameter values for one block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSnapshot {
    /// Saturation drive (dB, 0..24)
    pub drive: f64,
    /// Shape morph (0..1)
    pub shape: f64,
    /// Waveshape index (0..57)
    pub waveshape: usize,
    pub low_enable: bool,
    /// Low crossover (Hz, 20..1000)
    pub low_freq: f64,
    pub low_warmth: f64,
    /// Low band level (dB, -24..24)
    pub low_level: f64,
    pub high_enable: bool,
    /// High crossover (Hz, 1000..20000)
    pub high_freq: f64,
    pub high_softness: f64,
    /// High band level (dB, -24..24)
    pub high_level: f64,
    /// Input gain (dB, -24..24)
    pub input_gain: f64,
    /// Dry/wet (percent, 0..100)
    pub mix: f64,
    /// Output gain (dB, -24..24)
    #[serde(rename = "output")]
    pub output_gain: f64,
    /// false = saturate then split, true = split then saturate
    pub pre_post: bool,
    #[serde(rename = "limiter")]
    pub limiter_enabled: bool,
    pub bypass: bool,
    #[serde(rename = "delta")]
    pub delta_enabled: bool,
    /// Delta monitor gain (dB, -24..0)
    pub delta_gain: f64,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        let d = |id: ParamId| id.range().default;
        let on = |id: ParamId| id.range().default >= 0.5;
        Self {
            drive: d(ParamId::Drive),
            shape: d(ParamId::Shape),
            waveshape: d(ParamId::Waveshape) as usize,
            low_enable: on(ParamId::LowEnable),
            low_freq: d(ParamId::LowFreq),
            low_warmth: d(ParamId::LowWarmth),
            low_level: d(ParamId::LowLevel),
            high_enable: on(ParamId::HighEnable),
            high_freq: d(ParamId::HighFreq),
            high_softness: d(ParamId::HighSoftness),
            high_level: d(ParamId::HighLevel),
            input_gain: d(ParamId::InputGain),
            mix: d(ParamId::Mix),
            output_gain: d(ParamId::OutputGain),
            pre_post: on(ParamId::PrePost),
            limiter_enabled: on(ParamId::Limiter),
            bypass: on(ParamId::Bypass),
            delta_enabled: on(ParamId::Delta),
            delta_gain: d(ParamId::DeltaGain),
        }
    }
}

impl ParameterSnapshot {
    /// Read a field as a plain `f64` (toggles as 0.0 / 1.0)
    pub fn get(&self, id: ParamId) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match id {
            ParamId::Drive => self.drive,
            ParamId::Shape => self.shape,
            ParamId::Waveshape => self.waveshape as f64,
            ParamId::LowEnable => flag(self.low_enable),
            ParamId::LowFreq => self.low_freq,
            ParamId::LowWarmth => self.low_warmth,
            ParamId::LowLevel => self.low_level,
            ParamId::HighEnable => flag(self.high_enable),
            ParamId::HighFreq => self.high_freq,
            ParamId::HighSoftness => self.high_softness,
            ParamId::HighLevel => self.high_level,
            ParamId::InputGain => self.input_gain,
            ParamId::Mix => self.mix,
            ParamId::OutputGain => self.output_gain,
            ParamId::PrePost => flag(self.pre_post),
            ParamId::Limiter => flag(self.limiter_enabled),
            ParamId::Bypass => flag(self.bypass),
            ParamId::Delta => flag(self.delta_enabled),
            ParamId::DeltaGain => self.delta_gain,
        }
    }

    /// Write a field from a plain `f64` (toggles threshold at 0.5)
    pub fn set(&mut self, id: ParamId, value: f64) {
        let on = value >= 0.5;
        match id {
            ParamId::Drive => self.drive = value,
            ParamId::Shape => self.shape = value,
            ParamId::Waveshape => {
                self.waveshape = value.round().clamp(0.0, (WAVESHAPE_COUNT - 1) as f64) as usize
            }
            ParamId::LowEnable => self.low_enable = on,
            ParamId::LowFreq => self.low_freq = value,
            ParamId::LowWarmth => self.low_warmth = value,
            ParamId::LowLevel => self.low_level = value,
            ParamId::HighEnable => self.high_enable = on,
            ParamId::HighFreq => self.high_freq = value,
            ParamId::HighSoftness => self.high_softness = value,
            ParamId::HighLevel => self.high_level = value,
            ParamId::InputGain => self.input_gain = value,
            ParamId::Mix => self.mix = value,
            ParamId::OutputGain => self.output_gain = value,
            ParamId::PrePost => self.pre_post = on,
            ParamId::Limiter => self.limiter_enabled = on,
            ParamId::Bypass => self.bypass = on,
            ParamId::Delta => self.delta_enabled = on,
            ParamId::DeltaGain => self.delta_gain = value,
        }
    }

    #[inline]
    pub fn drive_gain(&self) -> f64 {
        db_to_gain(self.drive)
    }

    #[inline]
    pub fn input_gain_linear(&self) -> f64 {
        db_to_gain(self.input_gain)
    }

    #[inline]
    pub fn output_gain_linear(&self) -> f64 {
        db_to_gain(self.output_gain)
    }

    #[inline]
    pub fn low_level_gain(&self) -> f64 {
        db_to_gain(self.low_level)
    }

    #[inline]
    pub fn high_level_gain(&self) -> f64 {
        db_to_gain(self.high_level)
    }

    #[inline]
    pub fn delta_gain_linear(&self) -> f64 {
        db_to_gain(self.delta_gain)
    }

    /// Wet proportion in 0..1
    #[inline]
    pub fn mix_fraction(&self) -> f64 {
        (self.mix * 0.01).clamp(0.0, 1.0)
    }

    /// Parse externally persisted state. Missing fields take neutral defaults.
    pub fn from_json(json: &str) -> SatResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SatResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
