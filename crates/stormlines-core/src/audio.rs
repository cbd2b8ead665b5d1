//! Audio engine abstraction.
//!
//! Mirrors the subset of the Web Audio API the scene uses: node factories,
//! audio-rate connections (including connections into parameters, used for
//! FM and pan LFOs), immediate parameter sets and exponential ramps anchored
//! to the engine clock.

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
}

/// Automatable parameters addressed by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioParam {
    /// Gain node level.
    Gain,
    /// Oscillator or filter frequency in Hz.
    Frequency,
    /// Oscillator detune in cents.
    Detune,
    /// Filter resonance.
    Q,
    /// Stereo panner position in `[-1, 1]`.
    Pan,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to create {kind} node: {reason}")]
    Create { kind: &'static str, reason: String },
    #[error("failed to connect nodes: {0}")]
    Connect(String),
    #[error("{node} node has no {param:?} parameter")]
    UnknownParam { node: &'static str, param: AudioParam },
    #[error("failed to schedule {param:?}: {reason}")]
    Schedule { param: AudioParam, reason: String },
    #[error("failed to start oscillator: {0}")]
    Start(String),
    #[error("stale node handle")]
    StaleNode,
}

pub type AudioResult<T> = Result<T, AudioError>;

/// A signal-graph backend.
///
/// Methods take `&self`; backends are handles onto an engine whose state
/// lives elsewhere (the browser, or a graph shared with an audio thread).
pub trait AudioEngine {
    /// Cheap, cloneable node handle.
    type Node: Clone;

    /// Monotonic engine clock in seconds.
    fn current_time(&self) -> f64;

    /// Final output node.
    fn destination(&self) -> Self::Node;

    fn create_gain(&self, value: f32) -> AudioResult<Self::Node>;
    fn create_filter(&self, kind: FilterKind, frequency: f32, q: f32) -> AudioResult<Self::Node>;
    fn create_stereo_panner(&self, pan: f32) -> AudioResult<Self::Node>;
    /// Created stopped; call [`AudioEngine::start`] to make it sound.
    fn create_oscillator(
        &self,
        waveform: Waveform,
        frequency: f32,
        detune: f32,
    ) -> AudioResult<Self::Node>;

    fn connect(&self, from: &Self::Node, to: &Self::Node) -> AudioResult<()>;
    /// Route `from`'s output into a parameter of `to` (added to its value).
    fn connect_param(&self, from: &Self::Node, to: &Self::Node, param: AudioParam)
        -> AudioResult<()>;
    /// Drop every outgoing connection of `node`.
    fn disconnect(&self, node: &Self::Node);

    fn set_param(&self, node: &Self::Node, param: AudioParam, value: f32) -> AudioResult<()>;
    /// Exponential ramp from the previous scheduled value to `value`,
    /// reaching it at `end_time` (engine seconds). `value` must be positive.
    fn exponential_ramp(
        &self,
        node: &Self::Node,
        param: AudioParam,
        value: f32,
        end_time: f64,
    ) -> AudioResult<()>;

    fn start(&self, oscillator: &Self::Node) -> AudioResult<()>;
    /// No-op for nodes that are not oscillators or are already stopped.
    fn stop(&self, oscillator: &Self::Node);
}
