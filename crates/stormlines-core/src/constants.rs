use crate::surface::Rgba;

// Shared visual/audio tuning constants used by both web and native frontends.

// Canvas and scene layout
pub const CANVAS_WIDTH: f32 = 512.0;
pub const CANVAS_HEIGHT: f32 = 512.0;
pub const PATH_COUNT: usize = 1024;
pub const PATH_DENSITY: f32 = 0.03;

// Per-path profile, linear in i / PATH_COUNT
pub const Y_CENTER_BASE: f32 = 0.0;
pub const Y_CENTER_SPAN: f32 = 1.0;
pub const Y_RANGE_BASE: f32 = 0.01;
pub const Y_RANGE_SPAN: f32 = 0.04;
pub const SCROLL_SPEED_BASE: f32 = 0.1;
pub const SCROLL_SPEED_SPAN: f32 = 1.4;

// Jitter applied to each new point, as a fraction of the path step width
pub const POINT_JITTER_MIN: f32 = 0.4;
pub const POINT_JITTER_MAX: f32 = 1.0;

// Colors
pub const BACKGROUND: Rgba = Rgba::rgb(255, 255, 255);
pub const PATH_STROKE: Rgba = Rgba::new(0, 0, 0, 0x44 as f32 / 255.0);
pub const PATH_LINE_WIDTH: f32 = 1.0;
pub const LIGHTNING_RGB: [u8; 3] = [230, 240, 255];
pub const LIGHTNING_LINE_WIDTH: f32 = 0.3;

// Lightning spawn and lifetime
pub const LIGHTNING_PROBABILITY: f32 = 0.003;
pub const LIGHTNING_BASE_LIFESPAN_MS: f64 = 4000.0;
pub const LIGHTNING_LIFESPAN_MIN: f64 = 0.5;
pub const LIGHTNING_LIFESPAN_MAX: f64 = 1.5;

// Index walk across paths
pub const WALK_SEED_MIN: f32 = 0.3;
pub const WALK_SEED_MAX: f32 = 0.7;
pub const WALK_STEP_UP: f32 = 0.02; // r < this → +1
pub const WALK_STEP_DOWN: f32 = 0.04; // this > r >= WALK_STEP_UP → -1

// Lightning voice
pub const ENVELOPE_FLOOR: f32 = 1e-6;
pub const ENVELOPE_PEAK_MIN: f32 = 0.005;
pub const ENVELOPE_PEAK_MAX: f32 = 0.015;
pub const ENVELOPE_ATTACK_FRACTION: f64 = 0.02;
pub const ENVELOPE_TAIL: f32 = 1e-4;
pub const LOWPASS_HZ: (f32, f32) = (1000.0, 1200.0);
pub const LOWPASS_Q_SCALE: f32 = 4.0;
pub const HIGHPASS_HZ: (f32, f32) = (30.0, 800.0);
pub const CARRIER_HZ: f32 = 60.0;
pub const CARRIER_DETUNE_CENTS: (f32, f32) = (-1200.0, 1200.0);
pub const FM_INDEX: f32 = 1000.0;
pub const MODULATOR_BANDS_HZ: [(f32, f32); 6] = [
    (100.0, 300.0),     // low tone
    (2000.0, 4000.0),   // high
    (10000.0, 20000.0), // very high
    (1000.0, 3000.0),   // mid
    (10.0, 20.0),       // rumble
    (10.0, 20.0),       // rumble
];

// Ambient pool
pub const AMBIENT_VOICES: usize = 128;
pub const AMBIENT_GAIN_MIN: f32 = 0.1;
pub const AMBIENT_LFO_RATIO: f32 = 0.01;

// Shared buses
pub const MASTER_GAIN: f32 = 1.0;
pub const AMBIENT_HIGHPASS_HZ: f32 = 400.0;
pub const AMBIENT_HIGHPASS_Q: f32 = 1.0;
pub const AMBIENT_LOWPASS_HZ: f32 = 1000.0;
pub const AMBIENT_LOWPASS_Q: f32 = 0.001;

// Delta-time scrolling reference (one 60 Hz frame)
pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;
// Cap on frames caught up in one tick after the host stalls (hidden tab)
pub const MAX_CATCH_UP_FRAMES: f64 = 4.0;
