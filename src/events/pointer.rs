//! Orbit input on a viewer canvas: drag to rotate, wheel to dolly.
//!
//! Listeners live as long as the viewer's surface and are removed when it
//! is dropped.

use crate::constants::{WHEEL_LINE_PX, WHEEL_MAX_NOTCHES, WHEEL_NOTCH_PX, WHEEL_PAGE_PX};
use crate::input::{self, DragState};
use glam::Vec2;
use panel3d_core::ContainerId;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

type Handler = Closure<dyn FnMut(web::Event)>;

/// Owns the closures registered on one canvas.
pub struct CanvasListeners {
    target: web::EventTarget,
    handlers: Vec<(&'static str, Handler)>,
}

impl Drop for CanvasListeners {
    fn drop(&mut self) {
        for (name, handler) in &self.handlers {
            _ = self
                .target
                .remove_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
        }
    }
}

impl CanvasListeners {
    fn listen(&mut self, name: &'static str, handler: Handler) -> anyhow::Result<()> {
        self.target
            .add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        self.handlers.push((name, handler));
        Ok(())
    }
}

fn client_pos(ev: &web::PointerEvent) -> Vec2 {
    Vec2::new(ev.client_x() as f32, ev.client_y() as f32)
}

pub fn attach(
    canvas: &web::HtmlCanvasElement,
    container: ContainerId,
) -> anyhow::Result<CanvasListeners> {
    let mut listeners = CanvasListeners {
        target: canvas.clone().into(),
        handlers: Vec::new(),
    };
    let drag = Rc::new(RefCell::new(DragState::default()));

    {
        let drag = drag.clone();
        let canvas = canvas.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                return;
            };
            if input::is_primary_button(ev.button()) {
                drag.borrow_mut().begin(ev.pointer_id(), client_pos(ev));
                _ = canvas.set_pointer_capture(ev.pointer_id());
            }
            crate::with_runtime(|rt| {
                if let Some(v) = rt.manager.viewer_for_mut(container) {
                    v.on_pointer_down();
                }
            });
        }) as Box<dyn FnMut(_)>);
        listeners.listen("pointerdown", closure)?;
    }

    {
        let drag = drag.clone();
        let canvas = canvas.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                return;
            };
            let Some(delta) = drag.borrow_mut().move_to(ev.pointer_id(), client_pos(ev)) else {
                return;
            };
            let height = canvas.client_height().max(1) as f32;
            crate::with_runtime(|rt| {
                if let Some(v) = rt.manager.viewer_for_mut(container) {
                    v.on_drag(delta.x, delta.y, height);
                }
            });
        }) as Box<dyn FnMut(_)>);
        listeners.listen("pointermove", closure)?;
    }

    for name in ["pointerup", "pointercancel"] {
        let drag = drag.clone();
        let canvas = canvas.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                return;
            };
            if !drag.borrow_mut().end(ev.pointer_id()) {
                return;
            }
            _ = canvas.release_pointer_capture(ev.pointer_id());
            crate::with_runtime(|rt| {
                let now = rt.now();
                if let Some(v) = rt.manager.viewer_for_mut(container) {
                    v.on_pointer_up(now);
                }
            });
        }) as Box<dyn FnMut(_)>);
        listeners.listen(name, closure)?;
    }

    {
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(wheel) = ev.dyn_ref::<web::WheelEvent>() else {
                return;
            };
            ev.prevent_default();
            let px = input::wheel_delta_px(
                wheel.delta_y(),
                wheel.delta_mode(),
                WHEEL_LINE_PX,
                WHEEL_PAGE_PX,
            );
            let factor = input::wheel_dolly_factor(px, WHEEL_NOTCH_PX, WHEEL_MAX_NOTCHES);
            crate::with_runtime(|rt| {
                if let Some(v) = rt.manager.viewer_for_mut(container) {
                    v.on_wheel(factor);
                }
            });
        }) as Box<dyn FnMut(_)>);
        // Must not be passive, or the page scrolls along with the zoom.
        let opts = web::AddEventListenerOptions::new();
        opts.set_passive(false);
        listeners
            .target
            .add_event_listener_with_callback_and_add_event_listener_options(
                "wheel",
                closure.as_ref().unchecked_ref(),
                &opts,
            )
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        listeners.handlers.push(("wheel", closure));
    }

    Ok(listeners)
}
