mod common;

use common::{make_paths, DrawCall, FakeEngine, FakeKind, RecordingSurface};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stormlines_core::constants::*;
use stormlines_core::{walk_path_indices, AudioEngine, AudioParam, FilterKind, LineJoin, Lightning, Waveform};

fn engine_with_master() -> (FakeEngine, usize) {
    let engine = FakeEngine::new();
    let master = engine.create_gain(1.0).unwrap();
    engine.connect(&master, &engine.destination()).unwrap();
    (engine, master)
}

#[test]
fn walk_yields_one_in_range_index_per_path() {
    let mut rng = StdRng::seed_from_u64(10);
    let paths = make_paths(1024, &mut rng);
    let indices = walk_path_indices(&paths, &mut rng);
    assert_eq!(indices.len(), 1024);
    for (i, (&idx, path)) in indices.iter().zip(&paths).enumerate() {
        assert!(idx < path.len(), "path {i}: index {idx} >= len {}", path.len());
    }
}

#[test]
fn bolt_across_full_scene_selects_one_point_per_path() {
    let mut rng = StdRng::seed_from_u64(22);
    let paths = make_paths(1024, &mut rng);
    let (engine, master) = engine_with_master();
    let l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();
    assert_eq!(l.path_indices().len(), 1024);
    for (i, (&idx, path)) in l.path_indices().iter().zip(&paths).enumerate() {
        assert!(idx < path.len(), "path {i}: index {idx} >= len {}", path.len());
    }
}

#[test]
fn walk_starts_in_middle_band_of_first_path() {
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let paths = make_paths(8, &mut rng);
        let len = paths[0].len() as f32;
        let start = walk_path_indices(&paths, &mut rng)[0];
        let lo = (len * WALK_SEED_MIN) as usize;
        let hi = (len * WALK_SEED_MAX) as usize;
        assert!((lo..=hi).contains(&start), "seed {seed}: start {start} outside {lo}..={hi}");
    }
}

#[test]
fn walk_moves_at_most_one_step_between_paths() {
    let mut rng = StdRng::seed_from_u64(11);
    let paths = make_paths(1024, &mut rng);
    for _ in 0..20 {
        let indices = walk_path_indices(&paths, &mut rng);
        for pair in indices.windows(2) {
            assert!(pair[0].abs_diff(pair[1]) <= 1, "jump {pair:?}");
        }
    }
}

#[test]
fn walk_drift_is_unbiased() {
    let mut rng = StdRng::seed_from_u64(12);
    let paths = make_paths(1024, &mut rng);
    let walks = 400;
    let mut total = 0i64;
    let mut moved = 0;
    for _ in 0..walks {
        let indices = walk_path_indices(&paths, &mut rng);
        let drift = indices[1023] as i64 - indices[0] as i64;
        total += drift;
        if drift != 0 {
            moved += 1;
        }
    }
    let mean = total as f64 / walks as f64;
    assert!(mean.abs() < 1.5, "mean drift {mean} suggests a biased walk");
    assert!(moved > walks / 2, "walk barely moves: {moved}/{walks}");
}

#[test]
fn empty_scene_walks_nowhere() {
    let mut rng = StdRng::seed_from_u64(13);
    assert!(walk_path_indices(&[], &mut rng).is_empty());
}

#[test]
fn lifespan_and_expiry_follow_spawn_time() {
    let mut rng = StdRng::seed_from_u64(14);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    for _ in 0..200 {
        let l = Lightning::new(&engine, &master, &paths, 1_000.0, &mut rng).unwrap();
        assert!(
            (2_000.0..6_000.0).contains(&l.lifespan_ms()),
            "lifespan {}",
            l.lifespan_ms()
        );
        assert_eq!(l.expires_at(), 1_000.0 + l.lifespan_ms());
    }
}

#[test]
fn alpha_fades_linearly_to_expiry() {
    let mut rng = StdRng::seed_from_u64(15);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    let l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();
    let life = l.lifespan_ms();
    assert!((l.alpha(0.0) - 1.0).abs() < 1e-6);
    assert!((l.alpha(life / 2.0) - 0.5).abs() < 1e-6);
    assert!(!l.is_expired(life - 1.0));
    assert!(l.is_expired(life));
    assert!(l.alpha(life + 100.0) < 0.0);
}

#[test]
fn voice_has_expected_node_set_and_routing() {
    let mut rng = StdRng::seed_from_u64(16);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    let before = engine.state().nodes.len();
    let l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();
    let v = l.voice();

    let nodes = engine.state().nodes[before..].to_vec();
    let count = |k: FakeKind| nodes.iter().filter(|n| n.kind == k).count();
    assert_eq!(nodes.len(), 12);
    assert_eq!(count(FakeKind::Oscillator(Waveform::Sine)), 7);
    assert_eq!(count(FakeKind::Gain), 2);
    assert_eq!(count(FakeKind::Filter(FilterKind::Lowpass)), 1);
    assert_eq!(count(FakeKind::Filter(FilterKind::Highpass)), 1);
    assert_eq!(count(FakeKind::Panner), 1);
    assert!(v.oscillators.iter().all(|&o| engine.node(o).started));

    let to = |from: usize| -> Vec<(usize, Option<AudioParam>)> {
        engine.edges_from(from).iter().map(|e| (e.to, e.param)).collect()
    };
    assert_eq!(to(v.lowpass), vec![(master, None)]);
    assert_eq!(to(v.highpass), vec![(v.lowpass, None)]);
    assert_eq!(to(v.panner), vec![(v.highpass, None)]);
    assert_eq!(to(v.envelope), vec![(v.panner, None)]);
    assert_eq!(to(*v.carrier()), vec![(v.envelope, None)]);
    assert_eq!(to(v.fm), vec![(*v.carrier(), Some(AudioParam::Frequency))]);
    for m in &v.oscillators[1..] {
        assert_eq!(to(*m), vec![(v.fm, None)]);
    }
}

#[test]
fn voice_parameters_fall_in_tuned_bands() {
    let mut rng = StdRng::seed_from_u64(17);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    for _ in 0..50 {
        let l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();
        let v = l.voice();
        let ratio = (l.lifespan_ms() / LIGHTNING_BASE_LIFESPAN_MS) as f32;

        let lp = engine.node(v.lowpass);
        let f = lp.param(AudioParam::Frequency).unwrap();
        assert!((LOWPASS_HZ.0..=LOWPASS_HZ.1).contains(&f));
        assert!((lp.param(AudioParam::Q).unwrap() - ratio * LOWPASS_Q_SCALE).abs() < 1e-5);

        let hp = engine.node(v.highpass);
        let f = hp.param(AudioParam::Frequency).unwrap();
        assert!((HIGHPASS_HZ.0..=HIGHPASS_HZ.1).contains(&f));
        assert!((hp.param(AudioParam::Q).unwrap() - ratio).abs() < 1e-5);

        let carrier = engine.node(*v.carrier());
        assert_eq!(carrier.param(AudioParam::Frequency), Some(CARRIER_HZ));
        let detune = carrier.param(AudioParam::Detune).unwrap();
        assert!((CARRIER_DETUNE_CENTS.0..=CARRIER_DETUNE_CENTS.1).contains(&detune));

        for (m, band) in v.oscillators[1..].iter().zip(MODULATOR_BANDS_HZ) {
            let f = engine.node(*m).param(AudioParam::Frequency).unwrap();
            assert!(f >= band.0 && f <= band.1, "modulator {f} outside {band:?}");
        }
        assert_eq!(engine.node(v.fm).param(AudioParam::Gain), Some(FM_INDEX));

        let pan = engine.node(v.panner).param(AudioParam::Pan).unwrap();
        assert!((-1.0..=1.0).contains(&pan), "pan {pan}");
    }
}

#[test]
fn envelope_rises_then_decays_over_lifespan() {
    let mut rng = StdRng::seed_from_u64(18);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    engine.set_time(10.0);
    let l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();
    let env = engine.node(l.voice().envelope);
    let life_s = l.lifespan_ms() / 1000.0;

    assert_eq!(env.param(AudioParam::Gain), Some(ENVELOPE_FLOOR));
    assert_eq!(env.ramps.len(), 2);
    let (p, peak, t_peak) = env.ramps[0];
    assert_eq!(p, AudioParam::Gain);
    assert!((ENVELOPE_PEAK_MIN..=ENVELOPE_PEAK_MAX).contains(&peak));
    assert!((t_peak - (10.0 + life_s * ENVELOPE_ATTACK_FRACTION)).abs() < 1e-9);
    let (_, tail, t_end) = env.ramps[1];
    assert_eq!(tail, ENVELOPE_TAIL);
    assert!((t_end - (10.0 + life_s)).abs() < 1e-9);
}

#[test]
fn teardown_stops_and_disconnects_every_voice_node() {
    let mut rng = StdRng::seed_from_u64(19);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    let before = engine.state().nodes.len();
    let l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();
    l.teardown(&engine);

    let state = engine.state();
    for n in &state.nodes[before..] {
        assert_eq!(n.disconnect_calls, 1, "{:?} not disconnected once", n.kind);
        if n.is_oscillator() {
            assert_eq!(n.stop_calls, 1);
        }
    }
    assert_eq!(state.nodes[master].disconnect_calls, 0, "master bus must survive");
    assert!(state.edges.iter().all(|e| e.from < before), "voice edges remain");
}

#[test]
fn failed_spawn_releases_partial_voice() {
    let mut rng = StdRng::seed_from_u64(20);
    let paths = make_paths(16, &mut rng);
    let (engine, master) = engine_with_master();
    let before = engine.state().nodes.len();
    engine.fail_create_at(before + 6);

    assert!(Lightning::new(&engine, &master, &paths, 0.0, &mut rng).is_err());
    let state = engine.state();
    assert_eq!(state.nodes.len(), before + 6);
    for n in &state.nodes[before..] {
        assert_eq!(n.disconnect_calls, 1);
        assert!(!n.started);
    }
    assert!(state.edges.iter().all(|e| e.from < before));
}

#[test]
fn draw_reads_clamped_points_with_bolt_style() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut paths = make_paths(64, &mut rng);
    let (engine, master) = engine_with_master();
    let mut l = Lightning::new(&engine, &master, &paths, 0.0, &mut rng).unwrap();

    // Let the paths recycle so stored indices may outrun their lengths.
    for _ in 0..2_000 {
        for p in &mut paths {
            p.advance(1.0, &mut rng);
        }
        let pts = l.resolve_points(&paths).to_vec();
        assert_eq!(pts.len(), paths.len());
        for (p, path) in pts.iter().zip(&paths) {
            assert!(path.points().contains(p));
        }
    }

    let mut surface = RecordingSurface::new(512.0, 512.0);
    l.draw(&mut surface, &paths, l.lifespan_ms() / 4.0);
    match &surface.calls[..] {
        [DrawCall::Stroke { points, style }] => {
            assert_eq!(points.len(), 64);
            let [r, g, b] = LIGHTNING_RGB;
            assert_eq!((style.color.r, style.color.g, style.color.b), (r, g, b));
            assert!((style.color.a - 0.75).abs() < 1e-6);
            assert_eq!(style.line_width, LIGHTNING_LINE_WIDTH);
            assert_eq!(style.line_join, Some(LineJoin::Bevel));
        }
        other => panic!("expected one stroke, got {other:?}"),
    }
}
