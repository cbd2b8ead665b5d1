use crate::audio::{AudioEngine, AudioParam, AudioResult, Waveform};
use crate::constants::{AMBIENT_GAIN_MIN, AMBIENT_LFO_RATIO};
use rand::Rng;

/// One background drone: a saw oscillator whose stereo position is swept by
/// a slow sine LFO.
pub struct AmbientVoice<N> {
    pub oscillator: N,
    pub gain: N,
    pub lfo: N,
    pub panner: N,
    pub frequency: f32,
    pub level: f32,
}

/// Fixed pool of drones, started once at setup.
pub struct AmbientAudio<N> {
    voices: Vec<AmbientVoice<N>>,
}

impl<N: Clone> AmbientAudio<N> {
    /// Create `count` voices feeding `bus_in`.
    ///
    /// Levels are spread over `[0.1, 1) / count` so the sum stays below unity;
    /// frequencies are uniform in `[0, count)` Hz and the LFO runs at 1% of
    /// its voice's frequency.
    pub fn start<E, R>(engine: &E, bus_in: &N, count: usize, rng: &mut R) -> AudioResult<Self>
    where
        E: AudioEngine<Node = N>,
        R: Rng + ?Sized,
    {
        let mut voices = Vec::with_capacity(count);
        for _ in 0..count {
            let level = (rng.gen::<f32>() * (1.0 - AMBIENT_GAIN_MIN) + AMBIENT_GAIN_MIN) / count as f32;
            let frequency = rng.gen::<f32>() * count as f32;
            match AmbientVoice::start(engine, bus_in, level, frequency) {
                Ok(v) => voices.push(v),
                Err(e) => {
                    let partial = Self { voices };
                    partial.stop(engine);
                    return Err(e);
                }
            }
        }
        log::info!("[ambient] started {} voices", voices.len());
        Ok(Self { voices })
    }

    pub fn voices(&self) -> &[AmbientVoice<N>] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn stop<E: AudioEngine<Node = N>>(self, engine: &E) {
        for v in self.voices {
            v.stop(engine);
        }
    }
}

impl<N: Clone> AmbientVoice<N> {
    fn start<E: AudioEngine<Node = N>>(
        engine: &E,
        bus_in: &N,
        level: f32,
        frequency: f32,
    ) -> AudioResult<Self> {
        let panner = engine.create_stereo_panner(0.0)?;
        engine.connect(&panner, bus_in)?;

        let lfo = engine.create_oscillator(Waveform::Sine, frequency * AMBIENT_LFO_RATIO, 0.0)?;
        engine.connect_param(&lfo, &panner, AudioParam::Pan)?;

        let gain = engine.create_gain(level)?;
        engine.connect(&gain, &panner)?;

        let oscillator = engine.create_oscillator(Waveform::Sawtooth, frequency, 0.0)?;
        engine.connect(&oscillator, &gain)?;

        engine.start(&lfo)?;
        engine.start(&oscillator)?;

        Ok(Self {
            oscillator,
            gain,
            lfo,
            panner,
            frequency,
            level,
        })
    }

    fn stop<E: AudioEngine<Node = N>>(self, engine: &E) {
        engine.stop(&self.oscillator);
        engine.stop(&self.lfo);
        for node in [&self.oscillator, &self.lfo, &self.gain, &self.panner] {
            engine.disconnect(node);
        }
    }
}
