//! Software signal graph for the native front-end.
//!
//! Implements the node set the scene needs with Web Audio semantics:
//! oscillators with audio-rate frequency/detune inputs, gains, RBJ biquads
//! (Q in dB), an equal-power stereo panner and exponential parameter ramps.
//! The graph is rendered sample by sample in topological order and shared
//! with the cpal callback through `Arc<Mutex<_>>`.

use std::collections::VecDeque;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stormlines_core::{AudioEngine, AudioError, AudioParam, AudioResult, FilterKind, Waveform};

const PARAM_SLOTS: usize = 5;

fn param_slot(param: AudioParam) -> usize {
    match param {
        AudioParam::Gain => 0,
        AudioParam::Frequency => 1,
        AudioParam::Detune => 2,
        AudioParam::Q => 3,
        AudioParam::Pan => 4,
    }
}

/// Generational handle; stale after the node is collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn slot(&self) -> usize {
        self.index as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Input(usize),
    Param(usize, usize),
}

impl Target {
    fn slot(&self) -> usize {
        match *self {
            Target::Input(i) | Target::Param(i, _) => i,
        }
    }
}

/// Automatable value. Ramps are queued `(end_time, target)` pairs; each one
/// starts where the previous one ended.
#[derive(Clone, Debug)]
struct Param {
    value: f32,
    anchor: (f64, f32),
    ramps: VecDeque<(f64, f32)>,
}

impl Param {
    fn new(value: f32) -> Self {
        Self {
            value,
            anchor: (0.0, value),
            ramps: VecDeque::new(),
        }
    }

    fn set(&mut self, value: f32) {
        self.value = value;
        self.ramps.clear();
    }

    fn exponential_ramp(&mut self, value: f32, end_time: f64, now: f64) {
        if self.ramps.is_empty() {
            self.anchor = (now, self.value);
        }
        self.ramps.push_back((end_time, value));
    }

    fn value_at(&mut self, t: f64) -> f32 {
        while let Some(&(end, target)) = self.ramps.front() {
            if t < end {
                break;
            }
            self.value = target;
            self.anchor = (end, target);
            self.ramps.pop_front();
        }
        let Some(&(t1, v1)) = self.ramps.front() else {
            return self.value;
        };
        let (t0, v0) = self.anchor;
        if t1 <= t0 {
            return v1;
        }
        let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) as f32;
        if v0 > 0.0 && v1 > 0.0 {
            v0 * (v1 / v0).powf(frac)
        } else {
            v0 + (v1 - v0) * frac
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Biquad {
    key: (f32, f32),
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: [f32; 2],
    x2: [f32; 2],
    y1: [f32; 2],
    y2: [f32; 2],
}

impl Biquad {
    fn update(&mut self, kind: FilterKind, freq: f32, q_db: f32, sample_rate: f32) {
        if self.key == (freq, q_db) {
            return;
        }
        self.key = (freq, q_db);
        let w0 = TAU * (freq / sample_rate).clamp(1e-5, 0.49);
        let q = 10f32.powf(q_db / 20.0).max(1e-4);
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;
        let (b0, b1) = match kind {
            FilterKind::Lowpass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0),
            FilterKind::Highpass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0)),
        };
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = self.b0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    fn process(&mut self, input: [f32; 2]) -> [f32; 2] {
        let mut out = [0.0; 2];
        for ch in 0..2 {
            let y = self.b0 * input[ch] + self.b1 * self.x1[ch] + self.b2 * self.x2[ch]
                - self.a1 * self.y1[ch]
                - self.a2 * self.y2[ch];
            self.x2[ch] = self.x1[ch];
            self.x1[ch] = input[ch];
            self.y2[ch] = self.y1[ch];
            self.y1[ch] = y;
            out[ch] = y;
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OscState {
    Idle,
    Running,
    Stopped,
}

enum Kind {
    Destination,
    Gain {
        gain: Param,
    },
    Filter {
        kind: FilterKind,
        frequency: Param,
        q: Param,
        biquad: Biquad,
    },
    Panner {
        pan: Param,
    },
    Oscillator {
        waveform: Waveform,
        frequency: Param,
        detune: Param,
        phase: f32,
        state: OscState,
    },
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Kind::Destination => "destination",
            Kind::Gain { .. } => "gain",
            Kind::Filter { .. } => "filter",
            Kind::Panner { .. } => "panner",
            Kind::Oscillator { .. } => "oscillator",
        }
    }

    fn param_mut(&mut self, param: AudioParam) -> AudioResult<&mut Param> {
        let name = self.name();
        match (self, param) {
            (Kind::Gain { gain }, AudioParam::Gain) => Ok(gain),
            (Kind::Filter { frequency, .. }, AudioParam::Frequency) => Ok(frequency),
            (Kind::Filter { q, .. }, AudioParam::Q) => Ok(q),
            (Kind::Panner { pan }, AudioParam::Pan) => Ok(pan),
            (Kind::Oscillator { frequency, .. }, AudioParam::Frequency) => Ok(frequency),
            (Kind::Oscillator { detune, .. }, AudioParam::Detune) => Ok(detune),
            _ => Err(AudioError::UnknownParam { node: name, param }),
        }
    }

    fn process(&mut self, input: [f32; 2], modulation: &[f32; PARAM_SLOTS], t: f64, sr: f32) -> [f32; 2] {
        match self {
            Kind::Destination => input,
            Kind::Gain { gain } => {
                let g = gain.value_at(t) + modulation[param_slot(AudioParam::Gain)];
                [input[0] * g, input[1] * g]
            }
            Kind::Filter {
                kind,
                frequency,
                q,
                biquad,
            } => {
                let f = frequency.value_at(t) + modulation[param_slot(AudioParam::Frequency)];
                let q = q.value_at(t) + modulation[param_slot(AudioParam::Q)];
                biquad.update(*kind, f, q, sr);
                biquad.process(input)
            }
            Kind::Panner { pan } => {
                let p = (pan.value_at(t) + modulation[param_slot(AudioParam::Pan)]).clamp(-1.0, 1.0);
                let x = (p + 1.0) * 0.5 * FRAC_PI_2;
                let mono = 0.5 * (input[0] + input[1]);
                [mono * x.cos(), mono * x.sin()]
            }
            Kind::Oscillator {
                waveform,
                frequency,
                detune,
                phase,
                state,
            } => {
                if *state != OscState::Running {
                    return [0.0; 2];
                }
                let f = frequency.value_at(t) + modulation[param_slot(AudioParam::Frequency)];
                let cents = detune.value_at(t) + modulation[param_slot(AudioParam::Detune)];
                let hz = f * 2f32.powf(cents / 1200.0);
                let s = wave_sample(*phase, *waveform);
                *phase += hz / sr;
                *phase -= phase.floor();
                [s, s]
            }
        }
    }
}

/// One cycle of `waveform` at `phase` in `[0, 1)`.
fn wave_sample(phase: f32, waveform: Waveform) -> f32 {
    match waveform {
        Waveform::Sine => (TAU * phase).sin(),
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
    }
}

struct Node {
    kind: Kind,
    outputs: Vec<Target>,
    released: bool,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub struct Graph {
    sample_rate: f32,
    frame: u64,
    slots: Vec<Slot>,
    free: Vec<usize>,
    order: Vec<usize>,
    dirty: bool,
    acc_in: Vec<[f32; 2]>,
    acc_mod: Vec<[f32; PARAM_SLOTS]>,
    destination: NodeId,
}

impl Graph {
    pub fn new(sample_rate: f32) -> Self {
        let mut graph = Self {
            sample_rate,
            frame: 0,
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            dirty: true,
            acc_in: Vec::new(),
            acc_mod: Vec::new(),
            destination: NodeId {
                index: 0,
                generation: 0,
            },
        };
        graph.destination = graph.add(Kind::Destination);
        graph
    }

    /// Seconds of audio rendered so far.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Number of nodes currently alive, destination included.
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    fn add(&mut self, kind: Kind) -> NodeId {
        let node = Node {
            kind,
            outputs: Vec::new(),
            released: false,
        };
        self.dirty = true;
        if let Some(i) = self.free.pop() {
            let slot = &mut self.slots[i];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            return NodeId {
                index: i as u32,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        self.acc_in.push([0.0; 2]);
        self.acc_mod.push([0.0; PARAM_SLOTS]);
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn node_mut(&mut self, id: NodeId) -> AudioResult<&mut Node> {
        match self.slots.get_mut(id.slot()) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => Ok(node),
            _ => Err(AudioError::StaleNode),
        }
    }

    pub fn add_gain(&mut self, value: f32) -> NodeId {
        self.add(Kind::Gain {
            gain: Param::new(value),
        })
    }

    pub fn add_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> NodeId {
        self.add(Kind::Filter {
            kind,
            frequency: Param::new(frequency),
            q: Param::new(q),
            biquad: Biquad::default(),
        })
    }

    pub fn add_panner(&mut self, pan: f32) -> NodeId {
        self.add(Kind::Panner {
            pan: Param::new(pan),
        })
    }

    pub fn add_oscillator(&mut self, waveform: Waveform, frequency: f32, detune: f32) -> NodeId {
        self.add(Kind::Oscillator {
            waveform,
            frequency: Param::new(frequency),
            detune: Param::new(detune),
            phase: 0.0,
            state: OscState::Idle,
        })
    }

    fn link(&mut self, from: NodeId, to: NodeId, target: Target) -> AudioResult<()> {
        self.node_mut(to)?;
        let node = self.node_mut(from)?;
        if !node.outputs.contains(&target) {
            node.outputs.push(target);
        }
        node.released = false;
        self.dirty = true;
        Ok(())
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> AudioResult<()> {
        self.link(from, to, Target::Input(to.slot()))
    }

    pub fn connect_param(&mut self, from: NodeId, to: NodeId, param: AudioParam) -> AudioResult<()> {
        self.node_mut(to)?.kind.param_mut(param)?;
        self.link(from, to, Target::Param(to.slot(), param_slot(param)))
    }

    /// Drop `id`'s outputs and collect whatever can no longer be heard.
    pub fn disconnect(&mut self, id: NodeId) {
        let released = match self.node_mut(id) {
            Ok(node) => {
                node.outputs.clear();
                node.released = true;
                true
            }
            Err(_) => false,
        };
        if released {
            self.dirty = true;
            self.collect_garbage();
        }
    }

    pub fn set_param(&mut self, id: NodeId, param: AudioParam, value: f32) -> AudioResult<()> {
        self.node_mut(id)?.kind.param_mut(param)?.set(value);
        Ok(())
    }

    pub fn exponential_ramp(
        &mut self,
        id: NodeId,
        param: AudioParam,
        value: f32,
        end_time: f64,
    ) -> AudioResult<()> {
        if !(value > 0.0) {
            return Err(AudioError::Schedule {
                param,
                reason: format!("exponential target must be positive, got {value}"),
            });
        }
        let now = self.time();
        self.node_mut(id)?
            .kind
            .param_mut(param)?
            .exponential_ramp(value, end_time, now);
        Ok(())
    }

    pub fn start(&mut self, id: NodeId) -> AudioResult<()> {
        match &mut self.node_mut(id)?.kind {
            Kind::Oscillator { state, .. } if *state == OscState::Idle => {
                *state = OscState::Running;
                Ok(())
            }
            Kind::Oscillator { .. } => Err(AudioError::Start("already started".into())),
            other => Err(AudioError::Start(format!("{} is not a source", other.name()))),
        }
    }

    pub fn stop(&mut self, id: NodeId) {
        let stopped = match self.node_mut(id) {
            Ok(Node {
                kind: Kind::Oscillator { state, .. },
                ..
            }) => {
                *state = OscState::Stopped;
                true
            }
            _ => false,
        };
        if stopped {
            self.collect_garbage();
        }
    }

    /// Remove stopped oscillators and released nodes that no longer reach
    /// the destination, then drop edges into removed nodes.
    fn collect_garbage(&mut self) {
        let n = self.slots.len();
        let mut reaches = vec![false; n];
        reaches[self.destination.slot()] = true;
        let mut changed = true;
        while changed {
            changed = false;
            for (i, slot) in self.slots.iter().enumerate() {
                let Some(node) = &slot.node else { continue };
                if !reaches[i] && node.outputs.iter().any(|t| reaches[t.slot()]) {
                    reaches[i] = true;
                    changed = true;
                }
            }
        }

        let mut removed = 0usize;
        for i in 0..n {
            let Some(node) = &self.slots[i].node else { continue };
            let stopped = matches!(
                node.kind,
                Kind::Oscillator {
                    state: OscState::Stopped,
                    ..
                }
            );
            if stopped || (node.released && !reaches[i]) {
                self.slots[i].node = None;
                self.free.push(i);
                removed += 1;
            }
        }
        if removed == 0 {
            return;
        }
        let alive = self
            .slots
            .iter()
            .map(|s| s.node.is_some())
            .collect::<Vec<_>>();
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                node.outputs.retain(|t| alive[t.slot()]);
            }
        }
        self.dirty = true;
        log::trace!("[synth] collected {removed} nodes, {} live", self.live_nodes());
    }

    fn rebuild_order(&mut self) {
        let n = self.slots.len();
        let mut indegree = vec![0usize; n];
        for slot in &self.slots {
            if let Some(node) = &slot.node {
                for t in &node.outputs {
                    indegree[t.slot()] += 1;
                }
            }
        }
        let mut queue: VecDeque<usize> = (0..n)
            .filter(|&i| self.slots[i].node.is_some() && indegree[i] == 0)
            .collect();
        self.order.clear();
        while let Some(i) = queue.pop_front() {
            self.order.push(i);
            if let Some(node) = &self.slots[i].node {
                for t in &node.outputs {
                    let j = t.slot();
                    indegree[j] -= 1;
                    if indegree[j] == 0 {
                        queue.push_back(j);
                    }
                }
            }
        }
        // Nodes left out sit on a cycle and stay silent.
        self.dirty = false;
    }

    /// Render one stereo frame.
    pub fn next_frame(&mut self) -> [f32; 2] {
        if self.dirty {
            self.rebuild_order();
        }
        let t = self.time();
        let sr = self.sample_rate;
        let dest = self.destination.slot();
        self.acc_in.iter_mut().for_each(|a| *a = [0.0; 2]);
        self.acc_mod.iter_mut().for_each(|m| *m = [0.0; PARAM_SLOTS]);

        let mut out = [0.0f32; 2];
        for &i in &self.order {
            let Some(node) = self.slots[i].node.as_mut() else {
                continue;
            };
            let y = node.kind.process(self.acc_in[i], &self.acc_mod[i], t, sr);
            if i == dest {
                out = y;
            }
            for target in &node.outputs {
                match *target {
                    Target::Input(j) => {
                        self.acc_in[j][0] += y[0];
                        self.acc_in[j][1] += y[1];
                    }
                    Target::Param(j, p) => self.acc_mod[j][p] += 0.5 * (y[0] + y[1]),
                }
            }
        }
        self.frame += 1;
        out
    }

    /// Fill an interleaved buffer, soft-clipping the mix.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let [l, r] = self.next_frame();
            let (l, r) = (l.tanh(), r.tanh());
            match frame {
                [mono] => *mono = 0.5 * (l + r),
                [left, right, rest @ ..] => {
                    *left = l;
                    *right = r;
                    rest.iter_mut().for_each(|s| *s = 0.0);
                }
                [] => {}
            }
        }
    }
}

/// [`AudioEngine`] handle over a graph shared with the output stream.
#[derive(Clone)]
pub struct SoftwareAudio {
    graph: Arc<Mutex<Graph>>,
}

impl SoftwareAudio {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(Graph::new(sample_rate))),
        }
    }

    pub fn shared(&self) -> Arc<Mutex<Graph>> {
        Arc::clone(&self.graph)
    }

    pub fn graph(&self) -> MutexGuard<'_, Graph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioEngine for SoftwareAudio {
    type Node = NodeId;

    fn current_time(&self) -> f64 {
        self.graph().time()
    }

    fn destination(&self) -> NodeId {
        self.graph().destination()
    }

    fn create_gain(&self, value: f32) -> AudioResult<NodeId> {
        Ok(self.graph().add_gain(value))
    }

    fn create_filter(&self, kind: FilterKind, frequency: f32, q: f32) -> AudioResult<NodeId> {
        Ok(self.graph().add_filter(kind, frequency, q))
    }

    fn create_stereo_panner(&self, pan: f32) -> AudioResult<NodeId> {
        Ok(self.graph().add_panner(pan))
    }

    fn create_oscillator(&self, waveform: Waveform, frequency: f32, detune: f32) -> AudioResult<NodeId> {
        Ok(self.graph().add_oscillator(waveform, frequency, detune))
    }

    fn connect(&self, from: &NodeId, to: &NodeId) -> AudioResult<()> {
        self.graph().connect(*from, *to)
    }

    fn connect_param(&self, from: &NodeId, to: &NodeId, param: AudioParam) -> AudioResult<()> {
        self.graph().connect_param(*from, *to, param)
    }

    fn disconnect(&self, node: &NodeId) {
        self.graph().disconnect(*node);
    }

    fn set_param(&self, node: &NodeId, param: AudioParam, value: f32) -> AudioResult<()> {
        self.graph().set_param(*node, param, value)
    }

    fn exponential_ramp(
        &self,
        node: &NodeId,
        param: AudioParam,
        value: f32,
        end_time: f64,
    ) -> AudioResult<()> {
        self.graph().exponential_ramp(*node, param, value, end_time)
    }

    fn start(&self, oscillator: &NodeId) -> AudioResult<()> {
        self.graph().start(*oscillator)
    }

    fn stop(&self, oscillator: &NodeId) {
        self.graph().stop(*oscillator);
    }
}
