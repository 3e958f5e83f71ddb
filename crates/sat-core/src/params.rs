//! Parameter types for the saturation engine

use portable_atomic::{AtomicF64, Ordering};
use serde::{Deserialize, Serialize};

/// Number of discrete waveshapes the engine understands
pub const WAVESHAPE_COUNT: usize = 58;

/// Every automatable parameter the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    Drive,
    Shape,
    Waveshape,
    LowEnable,
    LowFreq,
    LowWarmth,
    LowLevel,
    HighEnable,
    HighFreq,
    HighSoftness,
    HighLevel,
    InputGain,
    Mix,
    OutputGain,
    PrePost,
    Limiter,
    Bypass,
    Delta,
    DeltaGain,
}

impl ParamId {
    pub const COUNT: usize = 19;

    pub const ALL: [ParamId; Self::COUNT] = [
        Self::Drive,
        Self::Shape,
        Self::Waveshape,
        Self::LowEnable,
        Self::LowFreq,
        Self::LowWarmth,
        Self::LowLevel,
        Self::HighEnable,
        Self::HighFreq,
        Self::HighSoftness,
        Self::HighLevel,
        Self::InputGain,
        Self::Mix,
        Self::OutputGain,
        Self::PrePost,
        Self::Limiter,
        Self::Bypass,
        Self::Delta,
        Self::DeltaGain,
    ];

    /// Dense index (position in `ALL`)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable automation key
    pub fn key(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Shape => "shape",
            Self::Waveshape => "waveshape",
            Self::LowEnable => "lowEnable",
            Self::LowFreq => "lowFreq",
            Self::LowWarmth => "lowWarmth",
            Self::LowLevel => "lowLevel",
            Self::HighEnable => "highEnable",
            Self::HighFreq => "highFreq",
            Self::HighSoftness => "highSoftness",
            Self::HighLevel => "highLevel",
            Self::InputGain => "inputGain",
            Self::Mix => "mix",
            Self::OutputGain => "output",
            Self::PrePost => "prePost",
            Self::Limiter => "limiter",
            Self::Bypass => "bypass",
            Self::Delta => "delta",
            Self::DeltaGain => "deltaGain",
        }
    }

    /// Display name shown by hosts
    pub fn name(self) -> &'static str {
        match self {
            Self::Drive => "Saturation",
            Self::Shape => "Shape",
            Self::Waveshape => "Wave",
            Self::LowEnable => "Low",
            Self::LowFreq => "Low Freq",
            Self::LowWarmth => "Low Warmth",
            Self::LowLevel => "Low Level",
            Self::HighEnable => "High",
            Self::HighFreq => "High Freq",
            Self::HighSoftness => "High Softness",
            Self::HighLevel => "High Level",
            Self::InputGain => "Input",
            Self::Mix => "Mix",
            Self::OutputGain => "Output",
            Self::PrePost => "Pre/Post",
            Self::Limiter => "Limiter",
            Self::Bypass => "Bypass",
            Self::Delta => "Delta",
            Self::DeltaGain => "Delta Gain",
        }
    }

    /// Look up a parameter by its automation key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.key() == key)
    }

    /// Whether the parameter is a toggle (stored as 0.0 / 1.0)
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Self::LowEnable
                | Self::HighEnable
                | Self::PrePost
                | Self::Limiter
                | Self::Bypass
                | Self::Delta
        )
    }

    /// Value range and default
    pub fn range(self) -> ParamRange {
        match self {
            Self::Drive => ParamRange::linear(0.0, 24.0, 0.0),
            Self::Shape => ParamRange::linear(0.0, 1.0, 0.0),
            Self::Waveshape => ParamRange::stepped(0.0, (WAVESHAPE_COUNT - 1) as f64, 0.0),
            Self::LowEnable => ParamRange::toggle(false),
            Self::LowFreq => ParamRange::logarithmic(20.0, 1000.0, 150.0),
            Self::LowWarmth => ParamRange::linear(0.0, 1.0, 0.0),
            Self::LowLevel => ParamRange::linear(-24.0, 24.0, 0.0),
            Self::HighEnable => ParamRange::toggle(false),
            Self::HighFreq => ParamRange::logarithmic(1000.0, 20000.0, 5000.0),
            Self::HighSoftness => ParamRange::linear(0.0, 1.0, 0.0),
            Self::HighLevel => ParamRange::linear(-24.0, 24.0, 0.0),
            Self::InputGain => ParamRange::linear(-24.0, 24.0, 0.0),
            Self::Mix => ParamRange::linear(0.0, 100.0, 100.0),
            Self::OutputGain => ParamRange::linear(-24.0, 24.0, 0.0),
            Self::PrePost => ParamRange::toggle(false),
            Self::Limiter => ParamRange::toggle(true),
            Self::Bypass => ParamRange::toggle(false),
            Self::Delta => ParamRange::toggle(false),
            Self::DeltaGain => ParamRange::linear(-24.0, 0.0, 0.0),
        }
    }
}

/// Parameter range specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub skew: ParamSkew,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Linear,
        }
    }

    pub fn logarithmic(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Logarithmic,
        }
    }

    pub fn stepped(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Stepped,
        }
    }

    pub fn toggle(default: bool) -> Self {
        Self::stepped(0.0, 1.0, if default { 1.0 } else { 0.0 })
    }

    /// Clamp a plain value into range (stepped ranges round to the nearest step)
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        match self.skew {
            ParamSkew::Stepped => clamped.round(),
            _ => clamped,
        }
    }

    /// Denormalize a 0-1 value to actual value
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        match self.skew {
            ParamSkew::Linear => self.min + normalized * (self.max - self.min),
            ParamSkew::Stepped => (self.min + normalized * (self.max - self.min)).round(),
            ParamSkew::Logarithmic => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (log_min + normalized * (log_max - log_min)).exp()
            }
        }
    }

    /// Normalize an actual value to 0-1
    pub fn normalize(&self, value: f64) -> f64 {
        let clamped = self.clamp(value);
        match self.skew {
            ParamSkew::Linear | ParamSkew::Stepped => (clamped - self.min) / (self.max - self.min),
            ParamSkew::Logarithmic => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (clamped.ln() - log_min) / (log_max - log_min)
            }
        }
    }
}

/// Parameter skew type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamSkew {
    Linear,
    Logarithmic,
    /// Integer steps (choices and toggles)
    Stepped,
}

/// Atomic parameter for lock-free access
#[derive(Debug)]
pub struct AtomicParam {
    value: AtomicF64,
}

impl AtomicParam {
    pub fn new(value: f64) -> Self {
        Self {
            value: AtomicF64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
