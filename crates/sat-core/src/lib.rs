//! sat-core: Shared types for the saturation engine
//!
//! Foundation used by `sat-dsp` and `sat-engine`: sample type and gain
//! helpers, the error type, parameter metadata, the per-block
//! [`ParameterSnapshot`], the lock-free [`ParameterStore`] and the
//! [`EngineConfig`] accepted at prepare time.

mod config;
mod error;
mod params;
mod sample;
mod snapshot;
mod store;

pub use config::*;
pub use error::*;
pub use params::*;
pub use sample::*;
pub use snapshot::*;
pub use store::*;
