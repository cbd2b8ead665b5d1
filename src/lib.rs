#![cfg(target_arch = "wasm32")]
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use stormlines_core::{Scene, SceneConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod canvas;
mod constants;
mod dom;
mod frame;
mod overlay;

// Browsers create audio contexts suspended until a user gesture. Every
// click retries until the context is running.
fn wire_audio_resume(document: &web::Document, audio_ctx: &web::AudioContext) {
    let ctx = audio_ctx.clone();
    dom::add_document_click_listener(document, move || {
        if ctx.state() == web::AudioContextState::Running {
            return;
        }
        log::info!("[audio] resuming context after user gesture");
        _ = ctx.resume();
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(constants::LOG_LEVEL).ok();
    log::info!("stormlines-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| anyhow::anyhow!("no document body"))?;

    let mut config = SceneConfig::default();
    dom::apply_query_overrides(&mut config);

    let audio = audio::WebAudio::new()?;
    _ = audio.context().resume();
    wire_audio_resume(&document, audio.context());

    let canvas = canvas::Canvas2d::create(
        &document,
        &body,
        config.canvas_width as u32,
        config.canvas_height as u32,
    )?;
    let scene = Scene::new(config, audio)?;

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        scene,
        canvas,
        started: Instant::now(),
    }));
    frame::start_loop(frame_ctx);

    overlay::remove_unsupported_notice(&document);
    Ok(())
}
