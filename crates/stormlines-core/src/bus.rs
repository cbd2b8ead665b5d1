use crate::audio::{AudioEngine, AudioResult, FilterKind};
use crate::constants::*;

/// Shared output routing.
///
/// Lightning voices feed `master` directly; ambient voices go through a
/// band-limiting highpass → lowpass chain first.
pub struct AudioBus<N> {
    pub master: N,
    pub ambient_in: N,
    pub ambient_lowpass: N,
}

impl<N: Clone> AudioBus<N> {
    pub fn build<E: AudioEngine<Node = N>>(engine: &E) -> AudioResult<Self> {
        let master = engine.create_gain(MASTER_GAIN)?;
        engine.connect(&master, &engine.destination())?;

        let ambient_lowpass =
            engine.create_filter(FilterKind::Lowpass, AMBIENT_LOWPASS_HZ, AMBIENT_LOWPASS_Q)?;
        engine.connect(&ambient_lowpass, &master)?;

        let ambient_in =
            engine.create_filter(FilterKind::Highpass, AMBIENT_HIGHPASS_HZ, AMBIENT_HIGHPASS_Q)?;
        engine.connect(&ambient_in, &ambient_lowpass)?;

        Ok(Self {
            master,
            ambient_in,
            ambient_lowpass,
        })
    }
}
