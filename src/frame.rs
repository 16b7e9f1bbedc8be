use crate::flicker::Flicker;
use crate::hero::HeroRing;
use instant::Instant;
use panel3d_core::FrameStats;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Per-page animation state outside the viewer manager.
pub struct FrameContext {
    pub hero: Option<HeroRing>,
    pub flicker: Option<Flicker>,
    pub last_instant: Instant,
    pub failed_last: usize,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt_sec = (now - self.last_instant).as_secs_f32();
        self.last_instant = now;

        crate::drain_pending();
        if let Some(stats) = crate::with_runtime(|rt| {
            let t = rt.now();
            rt.manager.frame(t)
        }) {
            self.report(stats);
        }
        if let Some(hero) = &mut self.hero {
            hero.frame(dt_sec);
        }
        if let Some(flicker) = &mut self.flicker {
            flicker.frame(dt_sec);
        }
    }

    fn report(&mut self, stats: FrameStats) {
        if stats.failed != self.failed_last {
            log::debug!(
                "[panel3d] frame: drawn={} skipped={} failed={}",
                stats.drawn,
                stats.skipped,
                stats.failed
            );
            self.failed_last = stats.failed;
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx.borrow_mut().frame();
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
