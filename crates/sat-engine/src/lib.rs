//! sat-engine: Real-time saturation engine
//!
//! Ties the `sat-dsp` building blocks into one zero-allocation block
//! processor and publishes metering through lock-free telemetry.
//!
//! ## Usage
//! ```ignore
//! let store = Arc::new(ParameterStore::new());
//! let mut engine = SaturationEngine::new();
//! engine.prepare(EngineConfig::new(48000.0, 512, 2))?;
//! let meters = engine.telemetry();
//!
//! // audio thread
//! let snapshot = store.snapshot();
//! engine.process(&mut [left, right], &snapshot);
//!
//! // UI thread
//! let peak_db = meters.peak_db();
//! ```

pub mod engine;
pub mod telemetry;

pub use engine::SaturationEngine;
pub use telemetry::{
    DEFAULT_SCOPE_CAPACITY, TelemetryReader, TelemetryWriter, telemetry_channel,
};

pub use sat_core::{EngineConfig, OversampleFactor, ParameterSnapshot, ParameterStore, SatError, SatResult};
