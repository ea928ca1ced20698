use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{window, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use crate::app::AppState;
use crate::camera::DragMode;

type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// DOM listeners feeding keyboard and mouse input into the shared
/// [`AppState`]. Listeners are removed when this is dropped.
pub struct WasmInputHandler {
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

impl WasmInputHandler {
    pub fn attach(canvas: &HtmlCanvasElement, app: Rc<RefCell<AppState>>) -> Result<Self> {
        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let window: &EventTarget = window.as_ref();
        let canvas: &EventTarget = canvas.as_ref();
        let mut handler = Self {
            listeners: Vec::new(),
        };

        let state = Rc::clone(&app);
        handler.listen(window, "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                state.borrow_mut().handle_key(&event.key());
            }
        })?;

        let state = Rc::clone(&app);
        handler.listen(canvas, "mousedown", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let mode = match event.button() {
                    0 => DragMode::Rotate,
                    2 => DragMode::Pan,
                    _ => return,
                };
                state.borrow_mut().pointer_down(client_position(event), mode);
            }
        })?;

        // Right-drag pans, so the context menu stays closed over the canvas.
        handler.listen(canvas, "contextmenu", |event| event.prevent_default())?;

        let state = Rc::clone(&app);
        handler.listen(window, "mousemove", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                state.borrow_mut().pointer_move(client_position(event));
            }
        })?;

        let state = Rc::clone(&app);
        handler.listen(window, "mouseup", move |_| state.borrow_mut().pointer_up())?;

        let state = app;
        handler.listen(canvas, "wheel", move |event| {
            if let Some(event) = event.dyn_ref::<WheelEvent>() {
                state.borrow_mut().wheel(event.delta_y() as f32);
            }
        })?;

        Ok(handler)
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        callback: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<()> {
        let closure: Listener = Closure::new(callback);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("failed to listen for {kind}: {err:?}"))?;
        self.listeners.push((target.clone(), kind, closure));
        Ok(())
    }
}

impl Drop for WasmInputHandler {
    fn drop(&mut self) {
        for (target, kind, closure) in self.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        }
    }
}

fn client_position(event: &MouseEvent) -> Vec2 {
    Vec2::new(event.client_x() as f32, event.client_y() as f32)
}
