use crate::ambient::AmbientAudio;
use crate::audio::{AudioEngine, AudioResult};
use crate::bus::AudioBus;
use crate::config::{ConfigError, SceneConfig, ScrollMode};
use crate::constants::MAX_CATCH_UP_FRAMES;
use crate::lightning::Lightning;
use crate::path::Path;
use crate::random::chance;
use crate::surface::DrawingSurface;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Audio(#[from] crate::audio::AudioError),
}

/// What happened during one [`Scene::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: bool,
    pub retired: bool,
    pub live_lightnings: usize,
}

/// All mutable scene state: paths, live bolts, rng and the audio engine.
///
/// Driven by the host's frame callback through [`Scene::tick`]; there is no
/// pause or stop, the scene lives as long as its host keeps ticking it.
pub struct Scene<E: AudioEngine> {
    config: SceneConfig,
    engine: E,
    bus: AudioBus<E::Node>,
    ambient: AmbientAudio<E::Node>,
    paths: Vec<Path>,
    lightnings: VecDeque<Lightning<E::Node>>,
    rng: StdRng,
    last_tick_ms: Option<f64>,
}

impl<E: AudioEngine> Scene<E> {
    pub fn new(config: SceneConfig, engine: E) -> Result<Self, SceneError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let bus = AudioBus::build(&engine)?;
        let ambient = AmbientAudio::start(&engine, &bus.ambient_in, config.ambient_voices, &mut rng)?;

        let paths = (0..config.path_count)
            .map(|i| {
                Path::new(
                    config.canvas_width,
                    config.canvas_height,
                    config.path_profile(i),
                    &mut rng,
                )
            })
            .collect::<Vec<_>>();
        log::info!(
            "[scene] paths={} canvas={}x{} points/path={} ambient={}",
            paths.len(),
            config.canvas_width,
            config.canvas_height,
            paths.first().map_or(0, Path::len),
            ambient.len()
        );

        Ok(Self {
            config,
            engine,
            bus,
            ambient,
            paths,
            lightnings: VecDeque::new(),
            rng,
            last_tick_ms: None,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn bus(&self) -> &AudioBus<E::Node> {
        &self.bus
    }

    pub fn ambient(&self) -> &AmbientAudio<E::Node> {
        &self.ambient
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn lightnings(&self) -> impl ExactSizeIterator<Item = &Lightning<E::Node>> {
        self.lightnings.iter()
    }

    /// One frame: clear, scroll and stroke every path, maybe spawn a bolt,
    /// retire the oldest expired bolt, then draw the live ones.
    pub fn tick<S: DrawingSurface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) -> TickReport {
        let mut report = TickReport::default();
        surface.clear(self.config.background);

        let scale = self.scroll_scale(now_ms);
        for path in &mut self.paths {
            path.advance(scale, &mut self.rng);
            path.render(surface);
        }

        if chance(&mut self.rng, self.config.lightning_probability) {
            report.spawned = self.spawn_lightning(now_ms).is_ok();
        }

        // Head check only: bolts are queued in spawn order, which is close
        // enough to expiry order.
        if self.lightnings.front().is_some_and(|l| l.is_expired(now_ms)) {
            if let Some(lightning) = self.lightnings.pop_front() {
                log::debug!(
                    "[lightning] retire lifespan={:.0}ms live={}",
                    lightning.lifespan_ms(),
                    self.lightnings.len()
                );
                lightning.teardown(&self.engine);
                report.retired = true;
            }
        }

        for lightning in &mut self.lightnings {
            lightning.draw(surface, &self.paths, now_ms);
        }
        report.live_lightnings = self.lightnings.len();
        report
    }

    /// Spawn a bolt now regardless of probability.
    pub fn spawn_lightning(&mut self, now_ms: f64) -> AudioResult<()> {
        match Lightning::new(&self.engine, &self.bus.master, &self.paths, now_ms, &mut self.rng) {
            Ok(lightning) => {
                log::debug!(
                    "[lightning] spawn lifespan={:.0}ms live={}",
                    lightning.lifespan_ms(),
                    self.lightnings.len() + 1
                );
                self.lightnings.push_back(lightning);
                Ok(())
            }
            Err(e) => {
                log::warn!("[lightning] spawn failed: {e}");
                Err(e)
            }
        }
    }

    fn scroll_scale(&mut self, now_ms: f64) -> f32 {
        let last = self.last_tick_ms.replace(now_ms);
        match self.config.scroll_mode {
            ScrollMode::FixedStep => 1.0,
            ScrollMode::DeltaTime { reference_frame_ms } => match last {
                Some(last) => {
                    ((now_ms - last) / reference_frame_ms).clamp(0.0, MAX_CATCH_UP_FRAMES) as f32
                }
                None => 1.0,
            },
        }
    }

    /// Tear down every bolt and the ambient pool. Used by hosts that can
    /// shut down cleanly (the native front-end on window close).
    pub fn shutdown(self) {
        for lightning in self.lightnings {
            lightning.teardown(&self.engine);
        }
        self.ambient.stop(&self.engine);
        log::info!("[scene] shut down");
    }
}
