//! Visibility and size tracking for viewer containers.
//!
//! Without `IntersectionObserver` every container is activated up front;
//! without `ResizeObserver` a window resize re-measures all of them.

use crate::constants::INTERSECTION_THRESHOLD;
use crate::dom::ContainerMap;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

type EntriesCallback = Closure<dyn FnMut(js_sys::Array)>;

pub struct Observers {
    intersection: Option<(web::IntersectionObserver, EntriesCallback)>,
    resize: Option<(web::ResizeObserver, EntriesCallback)>,
    window_resize: Option<Closure<dyn FnMut()>>,
}

impl Observers {
    pub fn install(containers: Rc<RefCell<ContainerMap>>) -> Self {
        let intersection = {
            let containers = containers.clone();
            let callback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<web::IntersectionObserverEntry>() else {
                        continue;
                    };
                    let Some(id) = containers.borrow().find(&entry.target()) else {
                        continue;
                    };
                    let visible = entry.is_intersecting();
                    crate::with_runtime(|rt| rt.on_intersection(id, visible));
                }
            }) as Box<dyn FnMut(_)>);
            let options = web::IntersectionObserverInit::new();
            options.set_threshold(&wasm_bindgen::JsValue::from_f64(INTERSECTION_THRESHOLD));
            match web::IntersectionObserver::new_with_options(
                callback.as_ref().unchecked_ref(),
                &options,
            ) {
                Ok(observer) => Some((observer, callback)),
                Err(e) => {
                    log::warn!("[panel3d] IntersectionObserver unavailable: {:?}", e);
                    None
                }
            }
        };

        let resize = {
            let containers = containers.clone();
            let callback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<web::ResizeObserverEntry>() else {
                        continue;
                    };
                    let Some(id) = containers.borrow().find(&entry.target()) else {
                        continue;
                    };
                    crate::with_runtime(|rt| rt.manager.resize(id));
                }
            }) as Box<dyn FnMut(_)>);
            match web::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => Some((observer, callback)),
                Err(e) => {
                    log::warn!("[panel3d] ResizeObserver unavailable: {:?}", e);
                    None
                }
            }
        };

        let window_resize = if resize.is_none() {
            let closure = Closure::wrap(Box::new(move || {
                crate::with_runtime(|rt| rt.resize_all());
            }) as Box<dyn FnMut()>);
            if let Some(window) = web::window() {
                _ = window
                    .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            }
            Some(closure)
        } else {
            None
        };

        Self {
            intersection,
            resize,
            window_resize,
        }
    }

    /// False when visibility cannot be observed and containers must be activated eagerly.
    pub fn tracks_visibility(&self) -> bool {
        self.intersection.is_some()
    }

    pub fn observe(&self, element: &web::Element) {
        if let Some((observer, _)) = &self.intersection {
            observer.observe(element);
        }
        if let Some((observer, _)) = &self.resize {
            observer.observe(element);
        }
    }

    pub fn unobserve(&self, element: &web::Element) {
        if let Some((observer, _)) = &self.intersection {
            observer.unobserve(element);
        }
        if let Some((observer, _)) = &self.resize {
            observer.unobserve(element);
        }
    }
}

impl Drop for Observers {
    fn drop(&mut self) {
        if let Some((observer, _)) = &self.intersection {
            observer.disconnect();
        }
        if let Some((observer, _)) = &self.resize {
            observer.disconnect();
        }
        if let (Some(window), Some(closure)) = (web::window(), &self.window_resize) {
            _ = window
                .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        }
    }
}
