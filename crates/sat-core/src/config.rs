//! Engine configuration and channel layout rules

use serde::{Deserialize, Serialize};

use crate::{SatError, SatResult};

/// Highest sample rate the engine accepts
pub const MAX_SAMPLE_RATE: f64 = 768_000.0;

/// Largest block the host may request at prepare time
pub const MAX_BLOCK_SIZE: usize = 65_536;

/// Oversampling factor for the nonlinear stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OversampleFactor {
    /// No oversampling (1x)
    X1,
    /// 2x oversampling
    X2,
    /// 4x oversampling
    #[default]
    X4,
}

impl OversampleFactor {
    pub fn factor(&self) -> usize {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }

    /// Number of cascaded 2x half-band stages
    pub fn stages(&self) -> usize {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
        }
    }
}

/// Channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelConfig {
    Mono,
    Stereo,
}

impl ChannelConfig {
    pub fn from_count(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            _ => None,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::Stereo
    }
}

/// Mono→mono or stereo→stereo only; input must match output
pub fn is_layout_supported(inputs: usize, outputs: usize) -> bool {
    inputs == outputs && ChannelConfig::from_count(outputs).is_some()
}

/// Everything `prepare` needs to size the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub max_block_size: usize,
    pub num_channels: usize,
    pub oversampling: OversampleFactor,
    /// Delay the dry path by the oversampler latency before mixing
    pub compensate_dry_latency: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 512,
            num_channels: 2,
            oversampling: OversampleFactor::X4,
            compensate_dry_latency: false,
        }
    }
}

impl EngineConfig {
    pub fn new(sample_rate: f64, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels,
            ..Self::default()
        }
    }

    pub fn with_oversampling(mut self, factor: OversampleFactor) -> Self {
        self.oversampling = factor;
        self
    }

    pub fn with_dry_compensation(mut self, enabled: bool) -> Self {
        self.compensate_dry_latency = enabled;
        self
    }

    pub fn channel_config(&self) -> Option<ChannelConfig> {
        ChannelConfig::from_count(self.num_channels)
    }

    /// Reject configurations before any audio flows
    pub fn validate(&self) -> SatResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 || self.sample_rate > MAX_SAMPLE_RATE
        {
            log::warn!("rejecting sample rate {}", self.sample_rate);
            return Err(SatError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE {
            log::warn!("rejecting block size {}", self.max_block_size);
            return Err(SatError::InvalidBlockSize(self.max_block_size));
        }
        if self.num_channels == 0 {
            return Err(SatError::InvalidChannelCount(0));
        }
        if !is_layout_supported(self.num_channels, self.num_channels) {
            log::warn!("rejecting {} channel layout", self.num_channels);
            return Err(SatError::UnsupportedLayout {
                inputs: self.num_channels,
                outputs: self.num_channels,
            });
        }
        Ok(())
    }
}
