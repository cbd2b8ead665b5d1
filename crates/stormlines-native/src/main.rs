use std::time::Instant;
use stormlines_core::{Scene, SceneConfig};
use winit::{dpi::LogicalSize, event::*, event_loop::EventLoop, window::WindowBuilder};

mod output;
mod render;
mod synth;

use render::{GpuState, LineBatch};

// Optional seed for a reproducible run.
const SEED_VAR: &str = "STORMLINES_SEED";

fn scene_config() -> SceneConfig {
    let mut config = SceneConfig::default();
    if let Ok(raw) = std::env::var(SEED_VAR) {
        match raw.parse() {
            Ok(seed) => config.seed = Some(seed),
            Err(_) => log::warn!("ignoring {SEED_VAR}={raw:?}: not an integer"),
        }
    }
    config
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = scene_config();
    let (engine, _stream) = output::open();
    let mut batch = LineBatch::new(config.canvas_width, config.canvas_height);
    let mut scene = Some(Scene::new(config.clone(), engine)?);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("stormlines")
        .with_inner_size(LogicalSize::new(
            config.canvas_width as f64,
            config.canvas_height as f64,
        ))
        .build(&event_loop)?;

    let mut state = pollster::block_on(GpuState::new(&window))?;
    let started = Instant::now();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::Resized(size),
            ..
        } => state.resize(size),
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } => {
            if let Some(scene) = scene.take() {
                scene.shutdown();
            }
            elwt.exit();
        }
        Event::AboutToWait => {
            let Some(scene) = scene.as_mut() else {
                return;
            };
            let now_ms = started.elapsed().as_secs_f64() * 1000.0;
            let report = scene.tick(&mut batch, now_ms);
            if report.spawned || report.retired {
                log::debug!(
                    "[frame] t={:.0}ms live={} nodes={}",
                    now_ms,
                    report.live_lightnings,
                    scene.engine().graph().live_nodes()
                );
            }
            match state.render(&batch) {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(e) => log::warn!("[render] {e}"),
            }
        }
        _ => {}
    })?;
    Ok(())
}
