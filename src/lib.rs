#![cfg(target_arch = "wasm32")]
//! Browser front-end: finds `[data-panel3d]` containers, activates a WebGPU
//! viewer for each one as it scrolls into view, and drives the decorative
//! hero and flicker canvases.

use instant::Instant;
use panel3d_core::{ContainerId, GearAnimator, ViewerManager};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod constants;
mod dom;
mod events;
mod flicker;
mod frame;
mod hero;
mod input;
mod loader;
mod observers;
mod render;

use dom::ContainerMap;
use observers::Observers;
use render::{GpuContext, WebSurfaceFactory};

pub(crate) struct Runtime {
    pub(crate) manager: ViewerManager,
    factory: WebSurfaceFactory,
    containers: Rc<RefCell<ContainerMap>>,
    observers: Observers,
    epoch: Instant,
}

impl Runtime {
    /// Seconds since start-up on a monotonic clock.
    pub(crate) fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    pub(crate) fn on_intersection(&mut self, id: ContainerId, visible: bool) {
        let Some(element) = self.containers.borrow().element(id).cloned() else {
            return;
        };
        match self.manager.on_intersection(
            id,
            visible,
            || dom::collect_attributes(&element),
            &mut self.factory,
        ) {
            Ok(Some(ensured)) if ensured.created => loader::spawn_loads(&ensured),
            Ok(_) => {}
            Err(e) => log::warn!("[panel3d] container {} not activated: {}", id.0, e),
        }
    }

    /// Starts tracking a container. Without visibility tracking it is
    /// activated straight away.
    fn watch(&mut self, id: ContainerId, element: &web::Element) {
        self.observers.observe(element);
        if !self.observers.tracks_visibility() {
            self.on_intersection(id, true);
        }
    }

    fn ensure(&mut self, element: &web::Element, force_resize: bool) -> bool {
        let known = self.containers.borrow().find(element);
        let id = known.unwrap_or_else(|| self.containers.borrow_mut().id_for(element));
        match self.manager.ensure_viewer(
            id,
            || dom::collect_attributes(element),
            &mut self.factory,
            force_resize,
        ) {
            Ok(ensured) => {
                if ensured.created {
                    loader::spawn_loads(&ensured);
                    self.watch(id, element);
                }
                true
            }
            Err(e) => {
                log::warn!("[panel3d] ensure_viewer failed: {}", e);
                false
            }
        }
    }

    fn dispose(&mut self, element: &web::Element) -> bool {
        let Some(id) = self.containers.borrow().find(element) else {
            return false;
        };
        self.observers.unobserve(element);
        self.manager.dispose(id)
    }

    pub(crate) fn resize_all(&mut self) {
        let ids = self.containers.borrow().ids();
        for id in ids {
            self.manager.resize(id);
        }
    }
}

enum PendingCall {
    Ensure(web::Element, bool),
    Dispose(web::Element),
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
    static PENDING: RefCell<Vec<PendingCall>> = const { RefCell::new(Vec::new()) };
}

/// Runs `f` against the page runtime. `None` before start-up finishes or
/// when called re-entrantly.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            log::debug!("[panel3d] runtime busy, call dropped");
            return None;
        };
        slot.as_mut().map(f)
    })
}

/// Replays page calls that arrived before the runtime could take them.
pub(crate) fn drain_pending() {
    let calls = PENDING.with(|p| std::mem::take(&mut *p.borrow_mut()));
    if calls.is_empty() {
        return;
    }
    for call in calls {
        let handled = with_runtime(|rt| match &call {
            PendingCall::Ensure(el, force) => {
                rt.ensure(el, *force);
            }
            PendingCall::Dispose(el) => {
                rt.dispose(el);
            }
        });
        if handled.is_none() {
            PENDING.with(|p| p.borrow_mut().push(call));
        }
    }
}

/// Activates the viewer for `element` now instead of waiting for it to
/// scroll into view. Returns false if no viewer could be built yet.
#[wasm_bindgen(js_name = ensureViewer)]
pub fn ensure_viewer(element: web::Element, force_resize: bool) -> bool {
    if let Some(ok) = with_runtime(|rt| rt.ensure(&element, force_resize)) {
        return ok;
    }
    PENDING.with(|p| p.borrow_mut().push(PendingCall::Ensure(element, force_resize)));
    false
}

/// Tears down the viewer for `element` and removes its canvas.
#[wasm_bindgen(js_name = disposeViewer)]
pub fn dispose_viewer(element: web::Element) -> bool {
    if let Some(done) = with_runtime(|rt| rt.dispose(&element)) {
        return done;
    }
    PENDING.with(|p| p.borrow_mut().push(PendingCall::Dispose(element)));
    false
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("[panel3d] starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("[panel3d] init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let animate = !dom::prefers_reduced_motion();

    let elements = dom::find_containers(&document);
    let gpu = if elements.is_empty() {
        None
    } else {
        match GpuContext::new().await {
            Ok(gpu) => Some(Rc::new(gpu)),
            Err(e) => {
                log::warn!("[panel3d] 3D viewers disabled: {:#}", e);
                None
            }
        }
    };

    let containers = Rc::new(RefCell::new(ContainerMap::default()));
    let mut manager = ViewerManager::new();
    manager.subscribe(Box::new(GearAnimator::new()));
    let observers = Observers::install(containers.clone());
    let runtime = Runtime {
        manager,
        factory: WebSurfaceFactory::new(gpu, containers.clone()),
        containers: containers.clone(),
        observers,
        epoch: Instant::now(),
    };
    RUNTIME.with(|cell| *cell.borrow_mut() = Some(runtime));

    with_runtime(|rt| {
        for element in &elements {
            let id = rt.containers.borrow_mut().id_for(element);
            rt.watch(id, element);
        }
    });
    log::info!("[panel3d] {} viewer container(s) found", elements.len());
    drain_pending();

    let frame_ctx = frame::FrameContext {
        hero: hero::HeroRing::find(&document, animate),
        flicker: flicker::Flicker::find(&document, animate),
        last_instant: Instant::now(),
        failed_last: 0,
    };
    frame::start_loop(Rc::new(RefCell::new(frame_ctx)));
    Ok(())
}
