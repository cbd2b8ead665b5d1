use crate::synth::{Graph, SoftwareAudio};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::sync::{Arc, Mutex, PoisonError};

// Used when no output device is available.
const FALLBACK_SAMPLE_RATE: f32 = 48_000.0;

/// Open the default output device and return an engine whose graph feeds
/// it. Without a device the engine still works but never renders.
pub fn open() -> (SoftwareAudio, Option<cpal::Stream>) {
    match try_open() {
        Ok((engine, stream)) => (engine, Some(stream)),
        Err(e) => {
            log::warn!("[audio] no output stream, running silent: {e:#}");
            (SoftwareAudio::new(FALLBACK_SAMPLE_RATE), None)
        }
    }
}

fn try_open() -> anyhow::Result<(SoftwareAudio, cpal::Stream)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("no default output device"))?;
    let supported = device.default_output_config()?;
    let sample_rate = supported.sample_rate().0 as f32;
    let channels = supported.channels() as usize;
    let engine = SoftwareAudio::new(sample_rate);
    let graph = engine.shared();
    let config: cpal::StreamConfig = supported.clone().into();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, graph)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, graph)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, graph)?,
        other => anyhow::bail!("unsupported sample format {other:?}"),
    };
    stream.play()?;
    log::info!(
        "[audio] output {} Hz, {} channels, {:?}",
        sample_rate,
        channels,
        supported.sample_format()
    );
    Ok((engine, stream))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    graph: Arc<Mutex<Graph>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            scratch.resize(data.len(), 0.0);
            graph
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .render_interleaved(&mut scratch, channels);
            for (out, s) in data.iter_mut().zip(&scratch) {
                *out = T::from_sample(*s);
            }
        },
        |err| log::error!("[audio] stream error: {err}"),
        None,
    )
}
