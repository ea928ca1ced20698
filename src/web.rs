#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlCanvasElement};

use crate::app::AppState;
use crate::config::{CANVAS_ID, DEFAULT_FONT_TIMEOUT, FONT_URL};
use crate::input::wasm::WasmInputHandler;
use crate::loader::{now_ms, FontLoad};
use crate::render::Renderer;

#[wasm_bindgen(start)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Browser handle. Create it with [`WasmApp::create`], then call `start`.
#[wasm_bindgen]
pub struct WasmApp {
    inner: Rc<RefCell<WebState>>,
    started: Cell<bool>,
}

#[wasm_bindgen]
impl WasmApp {
    /// Sets up the canvas, GPU and input, and starts fetching the font.
    /// Uses the canvas with `canvas_id` (default `glowcube-canvas`) or
    /// appends a full-window one to the body.
    pub async fn create(canvas_id: Option<String>) -> Result<WasmApp, JsValue> {
        let canvas_id = canvas_id.unwrap_or_else(|| CANVAS_ID.to_string());
        let canvas = find_or_create_canvas(&canvas_id).map_err(to_js)?;
        let (width, height) = (canvas.width(), canvas.height());

        let renderer = Renderer::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height)
            .await
            .map_err(to_js)?;

        let font_load = FontLoad::fetch(FONT_URL, Some(DEFAULT_FONT_TIMEOUT));
        let app = Rc::new(RefCell::new(AppState::new(width, height, Some(font_load))));
        let input = WasmInputHandler::attach(&canvas, Rc::clone(&app)).map_err(to_js)?;
        log::info!("rendering into #{canvas_id} at {width}x{height}");

        let state = WebState {
            renderer,
            app,
            _input: input,
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(state)),
            started: Cell::new(false),
        })
    }

    /// Starts the animation-frame loop. It runs for the life of the page;
    /// later calls do nothing.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.started.replace(true) {
            return Ok(());
        }
        run_animation_loop(Rc::clone(&self.inner)).map_err(to_js)
    }
}

struct WebState {
    renderer: Renderer,
    app: Rc<RefCell<AppState>>,
    _input: WasmInputHandler,
}

impl WebState {
    fn render_frame(&mut self) -> Result<()> {
        let mut app = self.app.borrow_mut();
        app.poll_font(now_ms());
        let frame = app.frame();
        self.renderer.render(&frame)
    }
}

type FrameCallback = Closure<dyn FnMut()>;

/// Drives `render_frame` from `requestAnimationFrame`. The callback holds a
/// handle to itself so it stays alive and can reschedule itself.
fn run_animation_loop(state: Rc<RefCell<WebState>>) -> Result<()> {
    let slot: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&slot);
    *slot.borrow_mut() = Some(Closure::new(move || {
        if let Err(err) = state.borrow_mut().render_frame() {
            log::error!("frame failed: {err:?}");
        }
        if let Err(err) = request_frame(next.borrow().as_ref()) {
            log::error!("{err:?}");
        }
    }));
    let first = slot.borrow();
    request_frame(first.as_ref())
}

fn request_frame(callback: Option<&FrameCallback>) -> Result<()> {
    let callback = callback.ok_or_else(|| anyhow!("animation callback missing"))?;
    window()
        .ok_or_else(|| anyhow!("window not available"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}

fn find_or_create_canvas(canvas_id: &str) -> Result<HtmlCanvasElement> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow!("document not available"))?;
    if let Some(element) = document.get_element_by_id(canvas_id) {
        return element
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| anyhow!("#{canvas_id} is not a canvas"));
    }

    let width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(1280.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(720.0);
    let canvas = create_canvas(&document, canvas_id)?;
    canvas.set_width(width.max(1.0) as u32);
    canvas.set_height(height.max(1.0) as u32);
    Ok(canvas)
}

fn create_canvas(document: &Document, canvas_id: &str) -> Result<HtmlCanvasElement> {
    let canvas = document
        .create_element("canvas")
        .map_err(|err| anyhow!("failed to create canvas: {err:?}"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("created element is not a canvas"))?;
    canvas.set_id(canvas_id);
    let body = document
        .body()
        .ok_or_else(|| anyhow!("document has no body element"))?;
    body.append_child(&canvas)
        .map_err(|err| anyhow!("failed to append canvas: {err:?}"))?;
    Ok(canvas)
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
