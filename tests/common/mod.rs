// Test doubles shared by the integration tests: a surface that records draw
// calls and an audio engine that records graph state.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use stormlines_core::{
    AudioEngine, AudioError, AudioParam, AudioResult, DrawingSurface, FilterKind, Path, Rgba,
    SceneConfig, StrokeStyle, Vec2, Waveform,
};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear(Rgba),
    Stroke { points: Vec<Vec2>, style: StrokeStyle },
}

pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&[Vec2], &StrokeStyle)> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Stroke { points, style } => Some((points.as_slice(), style)),
            DrawCall::Clear(_) => None,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn stroke_polyline(&mut self, points: &[Vec2], style: &StrokeStyle) {
        self.calls.push(DrawCall::Stroke {
            points: points.to_vec(),
            style: *style,
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FakeKind {
    Destination,
    Gain,
    Filter(FilterKind),
    Panner,
    Oscillator(Waveform),
}

#[derive(Clone, Debug)]
pub struct FakeNode {
    pub kind: FakeKind,
    pub params: Vec<(AudioParam, f32)>,
    pub ramps: Vec<(AudioParam, f32, f64)>,
    pub started: bool,
    pub stop_calls: usize,
    pub disconnect_calls: usize,
}

impl FakeNode {
    pub fn param(&self, param: AudioParam) -> Option<f32> {
        self.params
            .iter()
            .rev()
            .find(|(p, _)| *p == param)
            .map(|&(_, v)| v)
    }

    pub fn is_oscillator(&self) -> bool {
        matches!(self.kind, FakeKind::Oscillator(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub param: Option<AudioParam>,
}

#[derive(Default)]
pub struct FakeState {
    pub time: f64,
    pub nodes: Vec<FakeNode>,
    pub edges: Vec<Edge>,
    /// Node creation fails once this many nodes exist.
    pub fail_create_at: Option<usize>,
}

/// Recording engine. Clones share state, so a test can keep a handle after
/// moving the engine into a `Scene`.
#[derive(Clone)]
pub struct FakeEngine {
    state: Rc<RefCell<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        let engine = Self {
            state: Rc::new(RefCell::new(FakeState::default())),
        };
        engine.push(FakeKind::Destination, Vec::new());
        engine
    }

    pub fn state(&self) -> std::cell::Ref<'_, FakeState> {
        self.state.borrow()
    }

    pub fn set_time(&self, t: f64) {
        self.state.borrow_mut().time = t;
    }

    pub fn fail_create_at(&self, count: usize) {
        self.state.borrow_mut().fail_create_at = Some(count);
    }

    pub fn node(&self, id: usize) -> FakeNode {
        self.state.borrow().nodes[id].clone()
    }

    pub fn edges_from(&self, id: usize) -> Vec<Edge> {
        self.state
            .borrow()
            .edges
            .iter()
            .filter(|e| e.from == id)
            .copied()
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&FakeNode) -> bool) -> usize {
        self.state.borrow().nodes.iter().filter(|n| pred(n)).count()
    }

    fn push(&self, kind: FakeKind, params: Vec<(AudioParam, f32)>) -> usize {
        let mut s = self.state.borrow_mut();
        s.nodes.push(FakeNode {
            kind,
            params,
            ramps: Vec::new(),
            started: false,
            stop_calls: 0,
            disconnect_calls: 0,
        });
        s.nodes.len() - 1
    }

    fn create(&self, kind: FakeKind, params: Vec<(AudioParam, f32)>) -> AudioResult<usize> {
        let s = self.state.borrow();
        if s.fail_create_at.is_some_and(|n| s.nodes.len() >= n) {
            return Err(AudioError::Create {
                kind: "fake",
                reason: "injected failure".into(),
            });
        }
        drop(s);
        Ok(self.push(kind, params))
    }

    fn check(&self, id: usize) -> AudioResult<()> {
        if id < self.state.borrow().nodes.len() {
            Ok(())
        } else {
            Err(AudioError::StaleNode)
        }
    }
}

impl AudioEngine for FakeEngine {
    type Node = usize;

    fn current_time(&self) -> f64 {
        self.state.borrow().time
    }

    fn destination(&self) -> usize {
        0
    }

    fn create_gain(&self, value: f32) -> AudioResult<usize> {
        self.create(FakeKind::Gain, vec![(AudioParam::Gain, value)])
    }

    fn create_filter(&self, kind: FilterKind, frequency: f32, q: f32) -> AudioResult<usize> {
        self.create(
            FakeKind::Filter(kind),
            vec![(AudioParam::Frequency, frequency), (AudioParam::Q, q)],
        )
    }

    fn create_stereo_panner(&self, pan: f32) -> AudioResult<usize> {
        self.create(FakeKind::Panner, vec![(AudioParam::Pan, pan)])
    }

    fn create_oscillator(&self, waveform: Waveform, frequency: f32, detune: f32) -> AudioResult<usize> {
        self.create(
            FakeKind::Oscillator(waveform),
            vec![(AudioParam::Frequency, frequency), (AudioParam::Detune, detune)],
        )
    }

    fn connect(&self, from: &usize, to: &usize) -> AudioResult<()> {
        self.check(*from)?;
        self.check(*to)?;
        self.state.borrow_mut().edges.push(Edge {
            from: *from,
            to: *to,
            param: None,
        });
        Ok(())
    }

    fn connect_param(&self, from: &usize, to: &usize, param: AudioParam) -> AudioResult<()> {
        self.check(*from)?;
        self.check(*to)?;
        self.state.borrow_mut().edges.push(Edge {
            from: *from,
            to: *to,
            param: Some(param),
        });
        Ok(())
    }

    fn disconnect(&self, node: &usize) {
        let mut s = self.state.borrow_mut();
        s.edges.retain(|e| e.from != *node);
        if let Some(n) = s.nodes.get_mut(*node) {
            n.disconnect_calls += 1;
        }
    }

    fn set_param(&self, node: &usize, param: AudioParam, value: f32) -> AudioResult<()> {
        self.check(*node)?;
        self.state.borrow_mut().nodes[*node].params.push((param, value));
        Ok(())
    }

    fn exponential_ramp(&self, node: &usize, param: AudioParam, value: f32, end_time: f64) -> AudioResult<()> {
        self.check(*node)?;
        if value <= 0.0 {
            return Err(AudioError::Schedule {
                param,
                reason: "non-positive target".into(),
            });
        }
        self.state.borrow_mut().nodes[*node]
            .ramps
            .push((param, value, end_time));
        Ok(())
    }

    fn start(&self, oscillator: &usize) -> AudioResult<()> {
        self.check(*oscillator)?;
        let mut s = self.state.borrow_mut();
        let n = &mut s.nodes[*oscillator];
        if !n.is_oscillator() || n.started {
            return Err(AudioError::Start(format!("cannot start {:?}", n.kind)));
        }
        n.started = true;
        Ok(())
    }

    fn stop(&self, oscillator: &usize) {
        if let Some(n) = self.state.borrow_mut().nodes.get_mut(*oscillator) {
            n.stop_calls += 1;
        }
    }
}

/// Paths laid out like a default scene of `count` paths.
pub fn make_paths<R: rand::Rng>(count: usize, rng: &mut R) -> Vec<Path> {
    let config = SceneConfig {
        path_count: count,
        ..SceneConfig::default()
    };
    (0..count)
        .map(|i| {
            Path::new(
                config.canvas_width,
                config.canvas_height,
                config.path_profile(i),
                rng,
            )
        })
        .collect()
}

/// Small, seeded, silent-by-default scene config for fast tests.
pub fn small_config() -> SceneConfig {
    SceneConfig {
        path_count: 32,
        ambient_voices: 4,
        lightning_probability: 0.0,
        seed: Some(7),
        ..SceneConfig::default()
    }
}
