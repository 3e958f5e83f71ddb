//! Error types for the saturation engine

use thiserror::Error;

/// Core error type
///
/// Only the non-real-time surface produces errors. Block processing
/// never fails.
#[derive(Error, Debug)]
pub enum SatError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    #[error("Unsupported channel layout: {inputs} in / {outputs} out")]
    UnsupportedLayout { inputs: usize, outputs: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type SatResult<T> = Result<T, SatError>;

