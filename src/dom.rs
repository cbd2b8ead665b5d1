use stormlines_core::SceneConfig;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Run `handler` on every click anywhere in the document.
pub fn add_document_click_listener(document: &web::Document, mut handler: impl FnMut() + 'static) {
    let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    _ = document.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Apply `?seed=`, `?paths=` and `?voices=` overrides from the page URL.
/// Unparseable values are logged and ignored.
pub fn apply_query_overrides(config: &mut SceneConfig) {
    let Some(search) = web::window().and_then(|w| w.location().search().ok()) else {
        return;
    };
    let Ok(params) = web::UrlSearchParams::new_with_str(&search) else {
        return;
    };
    if let Some(v) = params.get("seed") {
        match v.parse() {
            Ok(seed) => config.seed = Some(seed),
            Err(_) => log::warn!("[config] ignoring seed={v:?}"),
        }
    }
    if let Some(v) = params.get("paths") {
        match v.parse() {
            Ok(n) => config.path_count = n,
            Err(_) => log::warn!("[config] ignoring paths={v:?}"),
        }
    }
    if let Some(v) = params.get("voices") {
        match v.parse() {
            Ok(n) => config.ambient_voices = n,
            Err(_) => log::warn!("[config] ignoring voices={v:?}"),
        }
    }
}
