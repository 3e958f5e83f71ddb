//! Engine Integration Tests
//!
//! Drives `SaturationEngine` end to end the way a host would.
//! Verifies:
//! - Bypass and dry-only mix are exact passthrough
//! - Full-wet output equals the shaper → bands chain
//! - Delta monitoring and its crossfade
//! - Pre/post ordering converges when both bands are disabled
//! - Safety limiter ceiling, chunking of long host blocks
//! - Telemetry, prepare rejection, snapshot defaults from JSON

use approx::assert_relative_eq;
use sat_core::{ParamId, SatError, peak_of};
use sat_dsp::band::{BandProcessor, BandSettings};
use sat_dsp::mix;
use sat_dsp::saturation::{OversampledShaper, ShaperSettings};
use sat_dsp::waveshaper::{DEFAULT_SEED, Waveshape};
use sat_engine::{EngineConfig, OversampleFactor, ParameterSnapshot, ParameterStore, SaturationEngine};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZE: usize = 256;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn generate_sine(samples: usize, freq: f64, amplitude: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            amplitude * (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

fn engine_with(config: EngineConfig) -> SaturationEngine {
    init_logging();
    let mut engine = SaturationEngine::new();
    engine.prepare(config).unwrap();
    engine
}

/// Run a mono signal through the engine in host blocks of `block`
fn run_mono(engine: &mut SaturationEngine, input: &[f64], block: usize, snap: &ParameterSnapshot) -> Vec<f64> {
    let mut output = input.to_vec();
    for chunk in output.chunks_mut(block) {
        engine.process(&mut [chunk], snap);
    }
    output
}

/// Reference wet path for channel 0: drive + shaper, then bands
fn reference_wet(input: &[f64], factor: OversampleFactor, snap: &ParameterSnapshot) -> Vec<f64> {
    let mut shaper = OversampledShaper::new(factor, DEFAULT_SEED);
    shaper.prepare(BLOCK_SIZE);
    let mut bands = BandProcessor::new(SAMPLE_RATE);
    bands.prepare(SAMPLE_RATE, BLOCK_SIZE);

    let shaper_settings = ShaperSettings::from_snapshot(snap);
    let band_settings = BandSettings::from_snapshot(snap);
    bands.update(&band_settings);

    let mut wet = input.to_vec();
    for block in wet.chunks_mut(BLOCK_SIZE) {
        shaper.process(block, &shaper_settings);
        bands.process(block, &band_settings);
    }
    wet
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASSTHROUGH
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_bypass_is_bit_exact() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 2));
    let snap = ParameterSnapshot {
        bypass: true,
        drive: 24.0,
        waveshape: Waveshape::FuzzFace.index(),
        output_gain: 12.0,
        ..ParameterSnapshot::default()
    };

    let left = generate_sine(1000, 440.0, 1.5);
    let right = generate_sine(1000, 97.0, 0.2);
    let (mut l, mut r) = (left.clone(), right.clone());
    engine.process(&mut [l.as_mut_slice(), r.as_mut_slice()], &snap);

    assert_eq!(l, left);
    assert_eq!(r, right);
}

#[test]
fn test_mix_zero_returns_dry() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1));
    let snap = ParameterSnapshot {
        mix: 0.0,
        drive: 20.0,
        waveshape: Waveshape::Tube.index(),
        low_enable: true,
        low_warmth: 1.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let input = generate_sine(BLOCK_SIZE * 4, 330.0, 0.8);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &snap);
    assert_eq!(output, input);
}

#[test]
fn test_mix_full_returns_wet() {
    for factor in [OversampleFactor::X1, OversampleFactor::X4] {
        let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1).with_oversampling(factor));
        let snap = ParameterSnapshot {
            drive: 9.0,
            waveshape: Waveshape::TapeSat.index(),
            shape: 0.4,
            high_enable: true,
            high_softness: 0.6,
            limiter_enabled: false,
            ..ParameterSnapshot::default()
        };
        let input = generate_sine(BLOCK_SIZE * 4, 1200.0, 0.6);
        let output = run_mono(&mut engine, &input, BLOCK_SIZE, &snap);
        let expected = reference_wet(&input, factor, &snap);

        for (y, w) in output.iter().zip(&expected) {
            assert_relative_eq!(y, w, epsilon = 1e-12);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MIX / DELTA
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_half_mix_blends_dry_and_wet() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1).with_oversampling(OversampleFactor::X1));
    let snap = ParameterSnapshot {
        mix: 50.0,
        drive: 12.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let input = generate_sine(BLOCK_SIZE * 2, 200.0, 0.5);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &snap);
    let wet = reference_wet(&input, OversampleFactor::X1, &snap);

    for ((y, x), w) in output.iter().zip(&input).zip(&wet) {
        assert_relative_eq!(*y, mix::blend(*x, *w, 0.5), epsilon = 1e-12);
    }
}

#[test]
fn test_delta_settles_to_difference() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1).with_oversampling(OversampleFactor::X1));
    let snap = ParameterSnapshot {
        drive: 6.0,
        mix: 30.0,
        delta_enabled: true,
        delta_gain: -12.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let input = generate_sine(BLOCK_SIZE * 4, 150.0, 0.7);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &snap);
    let wet = reference_wet(&input, OversampleFactor::X1, &snap);
    let gain = snap.delta_gain_linear();

    // 10 ms fade = 480 frames at 48 kHz
    for i in 480..input.len() {
        assert_relative_eq!(output[i], mix::delta(input[i], wet[i], gain), epsilon = 1e-12);
    }
}

#[test]
fn test_delta_toggle_is_gradual() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1).with_oversampling(OversampleFactor::X1));
    let normal = ParameterSnapshot {
        mix: 0.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let delta = ParameterSnapshot {
        delta_enabled: true,
        drive: 24.0,
        ..normal
    };

    let dc = vec![0.5; BLOCK_SIZE];
    let before = run_mono(&mut engine, &dc, BLOCK_SIZE, &normal);
    assert_eq!(before, dc);

    let after = run_mono(&mut engine, &dc, BLOCK_SIZE, &delta);
    // Output moves from dry (0.5) toward the delta value in steps of at most 1/480
    let step = 1.0 / 480.0;
    let mut previous = before[BLOCK_SIZE - 1];
    for &y in &after {
        assert!((y - previous).abs() <= step + 1e-12);
        previous = y;
    }
}

#[test]
fn test_concrete_soft_clip_sample() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, 64, 1).with_oversampling(OversampleFactor::X1));
    let snap = ParameterSnapshot {
        waveshape: Waveshape::SoftClip.index(),
        drive: 0.0,
        shape: 0.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let output = run_mono(&mut engine, &[0.5], 64, &snap);
    assert!((output[0] - 0.4621).abs() < 1e-4);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERING / LIMITER / CHUNKING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_pre_post_converges_with_bands_disabled() {
    let config = EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 2);
    // Pre: saturate the full band, then split. Post: split, then saturate.
    let pre = ParameterSnapshot {
        drive: 15.0,
        waveshape: Waveshape::Transformer.index(),
        shape: 0.5,
        pre_post: false,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let post = ParameterSnapshot { pre_post: true, ..pre };

    let input = generate_sine(BLOCK_SIZE * 8, 2500.0, 0.9);
    let mut a = engine_with(config);
    let mut b = engine_with(config);
    let out_pre = run_mono(&mut a, &input, BLOCK_SIZE, &pre);
    let out_post = run_mono(&mut b, &input, BLOCK_SIZE, &post);

    for (x, y) in out_pre.iter().zip(&out_post) {
        assert!((x - y).abs() < 1e-9);
    }
}

#[test]
fn test_limiter_holds_ceiling() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 2));
    let telemetry = engine.telemetry();
    let snap = ParameterSnapshot {
        input_gain: 24.0,
        drive: 24.0,
        waveshape: Waveshape::HardClip.index(),
        low_enable: true,
        low_level: 24.0,
        output_gain: 24.0,
        ..ParameterSnapshot::default()
    };
    let ceiling = sat_core::db_to_gain(-0.3);

    let mut left = generate_sine(BLOCK_SIZE * 8, 60.0, 1.0);
    let mut right = generate_sine(BLOCK_SIZE * 8, 6000.0, 1.0);
    for (l, r) in left.chunks_mut(BLOCK_SIZE).zip(right.chunks_mut(BLOCK_SIZE)) {
        engine.process(&mut [l, r], &snap);
    }
    for &y in left.iter().chain(&right) {
        assert!(y.is_finite());
        assert!(y.abs() <= ceiling + 1e-15);
    }
    assert!(telemetry.gain_reduction_db() > 6.0);
    assert!(telemetry.peak() <= ceiling + 1e-15);
}

#[test]
fn test_non_finite_input_is_muted() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1));
    let mut input = generate_sine(BLOCK_SIZE, 440.0, 0.5);
    input[10] = f64::NAN;
    input[20] = f64::INFINITY;
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &ParameterSnapshot::default());
    assert!(output.iter().all(|y| y.is_finite()));
}

#[test]
fn test_long_host_block_is_chunked() {
    let config = EngineConfig::new(SAMPLE_RATE, 128, 1);
    let snap = ParameterSnapshot {
        drive: 12.0,
        waveshape: Waveshape::Crackle.index(),
        shape: 0.7,
        low_enable: true,
        low_warmth: 0.5,
        ..ParameterSnapshot::default()
    };
    let input = generate_sine(1000, 500.0, 0.8);

    let mut whole = engine_with(config);
    let one_block = run_mono(&mut whole, &input, 1000, &snap);

    let mut pieces = engine_with(config);
    let small_blocks = run_mono(&mut pieces, &input, 100, &snap);

    assert_eq!(whole.telemetry().blocks(), 1);
    assert_eq!(pieces.telemetry().blocks(), 10);
    for (a, b) in one_block.iter().zip(&small_blocks) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_stereo_channels_are_independent() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 2));
    let snap = ParameterSnapshot {
        drive: 6.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let input = generate_sine(BLOCK_SIZE, 440.0, 0.5);
    let (mut l, mut r) = (input.clone(), vec![0.0; BLOCK_SIZE]);
    engine.process(&mut [l.as_mut_slice(), r.as_mut_slice()], &snap);
    assert!(peak_of(&l) > 0.1);
    assert!(r.iter().all(|&y| y == 0.0));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TELEMETRY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_telemetry_scope_and_peak() {
    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 2));
    let reader = engine.telemetry();
    let snap = ParameterSnapshot::default();

    let mut last_left = Vec::new();
    for _ in 0..12 {
        let mut l = generate_sine(BLOCK_SIZE, 1000.0, 0.25);
        let mut r = generate_sine(BLOCK_SIZE, 1000.0, 0.9);
        engine.process(&mut [l.as_mut_slice(), r.as_mut_slice()], &snap);
        assert_relative_eq!(reader.peak(), peak_of(&l).max(peak_of(&r)), epsilon = 1e-15);
        last_left = l;
    }
    assert_eq!(reader.blocks(), 12);

    // Scope mirrors channel 0, oldest first
    let mut scope = vec![0.0; BLOCK_SIZE];
    assert_eq!(reader.copy_recent(&mut scope), BLOCK_SIZE);
    assert_eq!(scope, last_left);

    let handle = {
        let reader = reader.clone();
        std::thread::spawn(move || reader.blocks())
    };
    assert_eq!(handle.join().unwrap(), 12);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION / STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_prepare_rejections() {
    init_logging();
    let mut engine = SaturationEngine::new();
    assert!(matches!(
        engine.prepare(EngineConfig::new(0.0, 512, 2)),
        Err(SatError::InvalidSampleRate(_))
    ));
    assert!(matches!(
        engine.prepare(EngineConfig::new(48000.0, 512, 3)),
        Err(SatError::UnsupportedLayout { .. })
    ));
    assert!(!engine.is_prepared());

    assert!(engine.prepare(EngineConfig::new(44100.0, 64, 1)).is_ok());
    assert!(engine.prepare(EngineConfig::new(96000.0, 1024, 2)).is_ok());
    assert_eq!(engine.config().num_channels, 2);
}

#[test]
fn test_dry_compensation_aligns_paths() {
    let config = EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1).with_dry_compensation(true);
    let mut engine = engine_with(config);
    let latency = engine.latency();
    assert!(latency > 0);

    let snap = ParameterSnapshot {
        mix: 0.0,
        limiter_enabled: false,
        ..ParameterSnapshot::default()
    };
    let input = generate_sine(BLOCK_SIZE * 2, 300.0, 0.5);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &snap);

    assert!(output[..latency].iter().all(|&y| y == 0.0));
    for i in latency..input.len() {
        assert_eq!(output[i], input[i - latency]);
    }
}

#[test]
fn test_partial_json_state_uses_neutral_defaults() {
    let snap = ParameterSnapshot::from_json(r#"{"drive": 6.0, "waveshape": 4}"#).unwrap();
    assert!(!snap.bypass);
    assert_eq!(snap.mix, 100.0);

    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1));
    let input = generate_sine(BLOCK_SIZE, 440.0, 0.5);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &snap);
    assert!(output.iter().all(|y| y.is_finite()));
    assert_ne!(output, input);

    let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
    assert_eq!(value["waveshape"], 4);
}

#[test]
fn test_store_feeds_engine() {
    let store = ParameterStore::new();
    store.set_by_key("bypass", 1.0).unwrap();
    store.set(ParamId::Drive, 100.0);
    assert_eq!(store.get(ParamId::Drive), 24.0);

    let mut engine = engine_with(EngineConfig::new(SAMPLE_RATE, BLOCK_SIZE, 1));
    let input = generate_sine(BLOCK_SIZE, 440.0, 0.5);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &store.snapshot());
    assert_eq!(output, input);

    store.set(ParamId::Bypass, 0.0);
    let output = run_mono(&mut engine, &input, BLOCK_SIZE, &store.snapshot());
    assert_ne!(output, input);
}
