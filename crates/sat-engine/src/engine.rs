//! Saturation engine
//!
//! Signal flow per channel:
//! ```text
//! input ──┬── (dry delay) ───────────────────────────────┐
//!         └── input gain ─► shaper ─► bands ─► (wet) ──► mix ─► output gain ─► limiter
//!                          (or bands ─► shaper when pre/post is set)
//! ```
//!
//! `prepare` is the only place that allocates. `process` runs over
//! engine-owned scratch buffers and splits host blocks longer than the
//! prepared maximum into chunks.

use sat_core::{EngineConfig, ParameterSnapshot, Sample, SatResult, peak_of};
use sat_dsp::band::{BandProcessor, BandSettings};
use sat_dsp::delay::DelayLine;
use sat_dsp::denormal::ScopedFlushDenormals;
use sat_dsp::dynamics::SafetyLimiter;
use sat_dsp::mix::{MixEngine, MixSettings};
use sat_dsp::saturation::{OversampledShaper, ShaperSettings};
use sat_dsp::waveshaper::DEFAULT_SEED;
use sat_dsp::{MonoProcessor, Processor};

use crate::telemetry::{DEFAULT_SCOPE_CAPACITY, TelemetryReader, TelemetryWriter, telemetry_channel};

/// Per-channel DSP state
#[derive(Debug)]
struct ChannelStrip {
    shaper: OversampledShaper,
    bands: BandProcessor,
    dry_delay: DelayLine,
}

impl ChannelStrip {
    fn new(config: &EngineConfig, channel: usize) -> Self {
        let mut shaper =
            OversampledShaper::new(config.oversampling, DEFAULT_SEED.wrapping_add(channel as u32));
        shaper.prepare(config.max_block_size);

        let mut bands = BandProcessor::new(config.sample_rate);
        bands.prepare(config.sample_rate, config.max_block_size);

        let dry_delay = DelayLine::new(if config.compensate_dry_latency {
            shaper.latency()
        } else {
            0
        });

        Self {
            shaper,
            bands,
            dry_delay,
        }
    }

    fn reset(&mut self) {
        self.shaper.reset();
        self.bands.reset();
        self.dry_delay.reset();
    }
}

/// Everything derived from the snapshot once per block
#[derive(Debug, Clone, Copy)]
struct BlockSettings {
    shaper: ShaperSettings,
    bands: BandSettings,
    mix: MixSettings,
    input_gain: f64,
    output_gain: f64,
    pre_post: bool,
    limiter_enabled: bool,
}

impl BlockSettings {
    fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        Self {
            shaper: ShaperSettings::from_snapshot(snapshot),
            bands: BandSettings::from_snapshot(snapshot),
            mix: MixSettings::from_snapshot(snapshot),
            input_gain: snapshot.input_gain_linear(),
            output_gain: snapshot.output_gain_linear(),
            pre_post: snapshot.pre_post,
            limiter_enabled: snapshot.limiter_enabled,
        }
    }
}

/// Multi-channel saturation processor
#[derive(Debug)]
pub struct SaturationEngine {
    config: EngineConfig,
    prepared: bool,
    strips: Vec<ChannelStrip>,
    /// Unprocessed input, per channel
    dry: Vec<Vec<Sample>>,
    /// Processed path, mixed in place into the output
    wet: Vec<Vec<Sample>>,
    mixer: MixEngine,
    limiter: SafetyLimiter,
    telemetry: TelemetryWriter,
    reader: TelemetryReader,
}

impl SaturationEngine {
    /// Create an unprepared engine. `process` is a no-op until
    /// [`prepare`](Self::prepare) succeeds.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let (telemetry, reader) = telemetry_channel(DEFAULT_SCOPE_CAPACITY);
        Self {
            config,
            prepared: false,
            strips: Vec::new(),
            dry: Vec::new(),
            wet: Vec::new(),
            mixer: MixEngine::new(config.sample_rate),
            limiter: SafetyLimiter::new(config.sample_rate),
            telemetry,
            reader,
        }
    }

    /// Allocate and configure everything for `config`. Not real-time safe.
    ///
    /// On error the engine keeps its previous configuration.
    pub fn prepare(&mut self, config: EngineConfig) -> SatResult<()> {
        config.validate()?;

        let channels = config.num_channels;
        let block = config.max_block_size;

        self.strips = (0..channels).map(|ch| ChannelStrip::new(&config, ch)).collect();
        self.dry = vec![vec![0.0; block]; channels];
        self.wet = vec![vec![0.0; block]; channels];
        self.mixer = MixEngine::new(config.sample_rate);
        self.limiter = SafetyLimiter::new(config.sample_rate);
        self.telemetry.clear();
        self.config = config;
        self.prepared = true;

        log::info!(
            "Saturation engine prepared: {} Hz, {} samples, {} ch, {}x oversampling, latency {}",
            config.sample_rate,
            block,
            channels,
            config.oversampling.factor(),
            self.latency()
        );
        Ok(())
    }

    /// Clear all filter, oversampler, envelope and crossfade state
    /// without reallocating
    pub fn reset(&mut self) {
        for strip in &mut self.strips {
            strip.reset();
        }
        for buf in self.dry.iter_mut().chain(self.wet.iter_mut()) {
            buf.fill(0.0);
        }
        self.mixer.reset();
        self.limiter.reset();
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Latency of the wet path in base-rate samples (report to the host)
    pub fn latency(&self) -> usize {
        self.strips.first().map_or(0, |strip| strip.shaper.latency())
    }

    /// Handle for meters and scopes; clone freely across threads
    pub fn telemetry(&self) -> TelemetryReader {
        self.reader.clone()
    }

    /// Process one host block in place. Real-time safe.
    ///
    /// Only the channels present both in `buffer` and in the prepared
    /// configuration are processed, over the shortest channel length.
    /// Nothing happens while unprepared or bypassed.
    pub fn process(&mut self, buffer: &mut [&mut [Sample]], snapshot: &ParameterSnapshot) {
        if !self.prepared || snapshot.bypass {
            return;
        }

        let channels = buffer.len().min(self.strips.len());
        if channels == 0 {
            return;
        }
        let len = buffer[..channels].iter().map(|ch| ch.len()).min().unwrap_or(0);

        let _denormals = ScopedFlushDenormals::new();
        let settings = BlockSettings::from_snapshot(snapshot);

        for strip in &mut self.strips[..channels] {
            strip.bands.update(&settings.bands);
        }

        let max_block = self.config.max_block_size;
        let mut peak: Sample = 0.0;
        let mut gain_reduction_db: f64 = 0.0;
        let mut start = 0;

        while start < len {
            let n = (len - start).min(max_block);
            self.process_chunk(buffer, channels, start, n, &settings);

            for (ch, host) in buffer[..channels].iter_mut().enumerate() {
                let out = &self.wet[ch][..n];
                host[start..start + n].copy_from_slice(out);
                peak = peak.max(peak_of(out));
            }
            self.telemetry.push_scope(&self.wet[0][..n]);
            if settings.limiter_enabled {
                gain_reduction_db = gain_reduction_db.max(self.limiter.gain_reduction_db());
            }
            start += n;
        }

        self.telemetry.publish(peak, gain_reduction_db);
    }

    fn process_chunk(
        &mut self,
        buffer: &[&mut [Sample]],
        channels: usize,
        start: usize,
        n: usize,
        settings: &BlockSettings,
    ) {
        for (ch, strip) in self.strips[..channels].iter_mut().enumerate() {
            let input = &buffer[ch][start..start + n];

            let dry = &mut self.dry[ch][..n];
            dry.copy_from_slice(input);
            strip.dry_delay.process_block(dry);

            let wet = &mut self.wet[ch][..n];
            for (w, &x) in wet.iter_mut().zip(input) {
                *w = x * settings.input_gain;
            }

            if settings.pre_post {
                strip.bands.process(wet, &settings.bands);
                strip.shaper.process(wet, &settings.shaper);
            } else {
                strip.shaper.process(wet, &settings.shaper);
                strip.bands.process(wet, &settings.bands);
            }
        }

        let (dry, wet) = (&self.dry[..channels], &mut self.wet[..channels]);
        self.mixer.process(dry, wet, n, &settings.mix);

        if settings.output_gain != 1.0 {
            for ch in wet.iter_mut() {
                for x in &mut ch[..n] {
                    *x *= settings.output_gain;
                }
            }
        }

        if settings.limiter_enabled {
            self.limiter.process(wet, n);
        }
    }
}

impl Default for SaturationEngine {
    fn default() -> Self {
        Self::new()
    }
}
