use crate::constants::*;
use crate::surface::Rgba;
use thiserror::Error;

/// Linear mapping `base + span * t` used for per-path profiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub base: f32,
    pub span: f32,
}

impl Span {
    pub const fn new(base: f32, span: f32) -> Self {
        Self { base, span }
    }

    #[inline]
    pub fn at(&self, t: f32) -> f32 {
        self.base + self.span * t
    }
}

/// How far paths scroll per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollMode {
    /// `scroll_speed` per tick regardless of elapsed time.
    FixedStep,
    /// `scroll_speed` per `reference_frame_ms` of elapsed time, catching up
    /// at most `MAX_CATCH_UP_FRAMES` frames in one tick.
    DeltaTime { reference_frame_ms: f64 },
}

/// Placement and motion of one path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathProfile {
    /// Fraction of the canvas width used as initial point count, in `[0, 1]`.
    pub density: f32,
    /// Vertical center as a fraction of the canvas height.
    pub y_center: f32,
    /// Relative vertical jitter; 0 draws a straight line.
    pub y_range: f32,
    /// Leftward translation per tick, in canvas units.
    pub scroll_speed: f32,
}

/// Startup configuration for a [`crate::Scene`]. Not mutated after setup.
///
/// The defaults reproduce the reference scene: 1024 paths on a 512×512
/// canvas fanning out from slow, flat lines at the top to fast, rough lines
/// at the bottom, over a bed of 128 ambient saw voices.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub path_count: usize,
    pub path_density: f32,
    pub y_center: Span,
    pub y_range: Span,
    pub scroll_speed: Span,
    pub ambient_voices: usize,
    pub lightning_probability: f32,
    pub scroll_mode: ScrollMode,
    pub background: Rgba,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            path_count: PATH_COUNT,
            path_density: PATH_DENSITY,
            y_center: Span::new(Y_CENTER_BASE, Y_CENTER_SPAN),
            y_range: Span::new(Y_RANGE_BASE, Y_RANGE_SPAN),
            scroll_speed: Span::new(SCROLL_SPEED_BASE, SCROLL_SPEED_SPAN),
            ambient_voices: AMBIENT_VOICES,
            lightning_probability: LIGHTNING_PROBABILITY,
            scroll_mode: ScrollMode::FixedStep,
            background: BACKGROUND,
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("canvas must have a positive size, got {width}x{height}")]
    EmptyCanvas { width: f32, height: f32 },
    #[error("scene needs at least one path")]
    NoPaths,
    #[error("path density must be in (0, 1], got {0}")]
    Density(f32),
    #[error("lightning probability must be in [0, 1], got {0}")]
    Probability(f32),
    #[error("reference frame must be positive, got {0} ms")]
    ReferenceFrame(f64),
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(ConfigError::EmptyCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if self.path_count == 0 {
            return Err(ConfigError::NoPaths);
        }
        if !(self.path_density > 0.0 && self.path_density <= 1.0) {
            return Err(ConfigError::Density(self.path_density));
        }
        if !(0.0..=1.0).contains(&self.lightning_probability) {
            return Err(ConfigError::Probability(self.lightning_probability));
        }
        if let ScrollMode::DeltaTime { reference_frame_ms } = self.scroll_mode {
            if !(reference_frame_ms > 0.0) {
                return Err(ConfigError::ReferenceFrame(reference_frame_ms));
            }
        }
        Ok(())
    }

    /// Profile for path `index` of `path_count`.
    pub fn path_profile(&self, index: usize) -> PathProfile {
        let ratio = index as f32 / self.path_count.max(1) as f32;
        PathProfile {
            density: self.path_density,
            y_center: self.y_center.at(ratio),
            y_range: self.y_range.at(ratio),
            scroll_speed: self.scroll_speed.at(ratio),
        }
    }
}
