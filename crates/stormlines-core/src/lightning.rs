use crate::audio::{AudioEngine, AudioParam, AudioResult, FilterKind, Waveform};
use crate::constants::*;
use crate::path::Path;
use crate::random::{clamp_index, rand_band, rand_range, rand_range_f64};
use crate::surface::{DrawingSurface, LineJoin, Rgba, StrokeStyle};
use glam::Vec2;
use rand::Rng;

/// A short-lived bolt: one point picked on every path, joined top to bottom,
/// plus the FM voice that sounds while it fades.
pub struct Lightning<N> {
    lifespan_ms: f64,
    expires_at: f64,
    path_indices: Vec<usize>,
    rendered: Vec<Vec2>,
    voice: LightningVoice<N>,
}

impl<N: Clone> Lightning<N> {
    /// Sample a bolt across `paths` and start its voice, routed into `master`.
    pub fn new<E, R>(
        engine: &E,
        master: &N,
        paths: &[Path],
        now_ms: f64,
        rng: &mut R,
    ) -> AudioResult<Self>
    where
        E: AudioEngine<Node = N>,
        R: Rng + ?Sized,
    {
        let lifespan_ms = LIGHTNING_BASE_LIFESPAN_MS
            * rand_range_f64(rng, LIGHTNING_LIFESPAN_MIN, LIGHTNING_LIFESPAN_MAX);
        let path_indices = walk_path_indices(paths, rng);
        let pan = initial_pan(paths, &path_indices);
        let voice = LightningVoice::build(engine, master, lifespan_ms, pan, rng)?;

        Ok(Self {
            lifespan_ms,
            expires_at: now_ms + lifespan_ms,
            rendered: Vec::with_capacity(path_indices.len()),
            path_indices,
            voice,
        })
    }

    pub fn lifespan_ms(&self) -> f64 {
        self.lifespan_ms
    }

    pub fn expires_at(&self) -> f64 {
        self.expires_at
    }

    pub fn path_indices(&self) -> &[usize] {
        &self.path_indices
    }

    pub fn voice(&self) -> &LightningVoice<N> {
        &self.voice
    }

    #[inline]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.expires_at <= now_ms
    }

    /// Linear fade from 1 at spawn to 0 at expiry; slightly negative past it.
    #[inline]
    pub fn alpha(&self, now_ms: f64) -> f32 {
        ((self.expires_at - now_ms) / self.lifespan_ms) as f32
    }

    /// Re-read the selected point of every path. Paths may have recycled
    /// points since the bolt was sampled, so each index is clamped again.
    pub fn resolve_points(&mut self, paths: &[Path]) -> &[Vec2] {
        self.rendered.clear();
        self.rendered
            .extend(paths.iter().zip(&self.path_indices).map(|(path, &index)| {
                let points = path.points();
                points[clamp_index(index as i64, points.len())]
            }));
        &self.rendered
    }

    pub fn draw<S: DrawingSurface + ?Sized>(&mut self, surface: &mut S, paths: &[Path], now_ms: f64) {
        let [r, g, b] = LIGHTNING_RGB;
        let style = StrokeStyle {
            color: Rgba::new(r, g, b, self.alpha(now_ms)),
            line_width: LIGHTNING_LINE_WIDTH,
            line_join: Some(LineJoin::Bevel),
        };
        let points = self.resolve_points(paths);
        surface.stroke_polyline(points, &style);
    }

    /// Silence and release the voice. Consumes the bolt, so it runs once.
    pub fn teardown<E: AudioEngine<Node = N>>(self, engine: &E) {
        self.voice.teardown(engine);
    }
}

/// Correlated walk over path indices.
///
/// Starts somewhere in the middle 40% of the first path and drifts by ±1
/// with 2% probability each per subsequent path. The running index is left
/// unclamped; only the stored value is clamped to the path's length.
pub fn walk_path_indices<R: Rng + ?Sized>(paths: &[Path], rng: &mut R) -> Vec<usize> {
    let Some(first) = paths.first() else {
        return Vec::new();
    };
    let mut index = (first.len() as f32 * rand_range(rng, WALK_SEED_MIN, WALK_SEED_MAX)) as i64;
    let mut indices = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            let r = rng.gen::<f32>();
            if r < WALK_STEP_UP {
                index += 1;
            } else if r < WALK_STEP_DOWN {
                index -= 1;
            }
        }
        indices.push(clamp_index(index, path.len()));
    }
    indices
}

/// Stereo position of the bolt's middle point, `-1` at the left edge and `1`
/// at the right.
fn initial_pan(paths: &[Path], indices: &[usize]) -> f32 {
    let mid = paths.len() / 2;
    match (paths.get(mid), indices.get(mid)) {
        (Some(path), Some(&index)) => {
            let x = path.points()[clamp_index(index as i64, path.len())].x;
            ((x / path.canvas_width() - 0.5) * 2.0).clamp(-1.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Nodes owned by one bolt.
///
/// Carrier and modulators feed an exponential envelope, then pan, highpass
/// and lowpass into the master bus. The six modulators are summed in the FM
/// gain, whose output drives the carrier's frequency.
pub struct LightningVoice<N> {
    pub oscillators: [N; 7],
    pub envelope: N,
    pub fm: N,
    pub panner: N,
    pub highpass: N,
    pub lowpass: N,
}

impl<N: Clone> LightningVoice<N> {
    fn build<E, R>(
        engine: &E,
        master: &N,
        lifespan_ms: f64,
        pan: f32,
        rng: &mut R,
    ) -> AudioResult<Self>
    where
        E: AudioEngine<Node = N>,
        R: Rng + ?Sized,
    {
        let mut created: Vec<N> = Vec::with_capacity(13);
        match Self::wire(engine, master, lifespan_ms, pan, rng, &mut created) {
            Ok(voice) => Ok(voice),
            Err(e) => {
                for node in &created {
                    engine.stop(node);
                    engine.disconnect(node);
                }
                Err(e)
            }
        }
    }

    fn wire<E, R>(
        engine: &E,
        master: &N,
        lifespan_ms: f64,
        pan: f32,
        rng: &mut R,
        created: &mut Vec<N>,
    ) -> AudioResult<Self>
    where
        E: AudioEngine<Node = N>,
        R: Rng + ?Sized,
    {
        let lifespan_ratio = (lifespan_ms / LIGHTNING_BASE_LIFESPAN_MS) as f32;
        let lifespan_sec = lifespan_ms * 0.001;

        let mut track = |node: AudioResult<N>| -> AudioResult<N> {
            let node = node?;
            created.push(node.clone());
            Ok(node)
        };

        let lowpass = track(engine.create_filter(
            FilterKind::Lowpass,
            rand_band(rng, LOWPASS_HZ),
            lifespan_ratio * LOWPASS_Q_SCALE,
        ))?;
        let highpass = track(engine.create_filter(
            FilterKind::Highpass,
            rand_band(rng, HIGHPASS_HZ),
            lifespan_ratio,
        ))?;
        let panner = track(engine.create_stereo_panner(pan))?;
        let envelope = track(engine.create_gain(ENVELOPE_FLOOR))?;
        let carrier = track(engine.create_oscillator(
            Waveform::Sine,
            CARRIER_HZ,
            rand_band(rng, CARRIER_DETUNE_CENTS),
        ))?;
        let fm = track(engine.create_gain(FM_INDEX))?;
        let mut modulators = Vec::with_capacity(MODULATOR_BANDS_HZ.len());
        for band in MODULATOR_BANDS_HZ {
            modulators.push(track(engine.create_oscillator(
                Waveform::Sine,
                rand_band(rng, band),
                0.0,
            ))?);
        }

        engine.connect(&lowpass, master)?;
        engine.connect(&highpass, &lowpass)?;
        engine.connect(&panner, &highpass)?;
        engine.connect(&envelope, &panner)?;
        engine.connect(&carrier, &envelope)?;
        engine.connect_param(&fm, &carrier, AudioParam::Frequency)?;
        for m in &modulators {
            engine.connect(m, &fm)?;
        }

        let t0 = engine.current_time();
        engine.exponential_ramp(
            &envelope,
            AudioParam::Gain,
            rand_range(rng, ENVELOPE_PEAK_MIN, ENVELOPE_PEAK_MAX),
            t0 + lifespan_sec * ENVELOPE_ATTACK_FRACTION,
        )?;
        engine.exponential_ramp(&envelope, AudioParam::Gain, ENVELOPE_TAIL, t0 + lifespan_sec)?;

        let oscillators: [N; 7] = [
            carrier,
            modulators[0].clone(),
            modulators[1].clone(),
            modulators[2].clone(),
            modulators[3].clone(),
            modulators[4].clone(),
            modulators[5].clone(),
        ];
        for osc in &oscillators {
            engine.start(osc)?;
        }

        Ok(Self {
            oscillators,
            envelope,
            fm,
            panner,
            highpass,
            lowpass,
        })
    }

    pub fn carrier(&self) -> &N {
        &self.oscillators[0]
    }

    pub fn gains(&self) -> [&N; 2] {
        [&self.envelope, &self.fm]
    }

    fn teardown<E: AudioEngine<Node = N>>(self, engine: &E) {
        for osc in &self.oscillators {
            engine.stop(osc);
            engine.disconnect(osc);
        }
        for node in [&self.envelope, &self.fm, &self.panner, &self.highpass, &self.lowpass] {
            engine.disconnect(node);
        }
    }
}
