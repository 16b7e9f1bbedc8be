//! Hero banner particles tracing a cycle of closed curves on a 2D canvas.

use crate::constants::*;
use crate::dom;
use crate::input;
use panel3d_core::paths::PathProgram;
use panel3d_core::ring::RingParticleSet;
use std::f64::consts::TAU;
use web_sys as web;

pub struct HeroRing {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
    ring: RingParticleSet,
    step: usize,
    hold: f32,
    animate: bool,
    drawn: bool,
}

impl HeroRing {
    /// `None` when the page has no hero canvas.
    pub fn find(document: &web::Document, animate: bool) -> Option<Self> {
        let canvas = dom::query_canvas(document, HERO_SELECTOR)?;
        let ctx = dom::context_2d(&canvas)?;
        let ring = RingParticleSet::new(
            HERO_PARTICLES,
            PathProgram::CYCLE[0],
            HERO_MORPH_SEC,
            HERO_STAGGER_SEC,
        );
        log::info!(
            "[hero] {} particles, {}",
            HERO_PARTICLES,
            if animate { "animated" } else { "static" }
        );
        Some(Self {
            canvas,
            ctx,
            ring,
            step: 0,
            hold: 0.0,
            animate,
            drawn: false,
        })
    }

    pub fn frame(&mut self, dt: f32) {
        if !self.animate {
            // Reduced motion: one settled shape, redrawn only on resize.
            let size = (self.canvas.width(), self.canvas.height());
            if dom::sync_canvas_backing_size(&self.canvas, &self.canvas) != size || !self.drawn {
                self.draw();
            }
            return;
        }
        self.ring.advance(dt);
        if self.ring.is_settled() {
            self.hold += dt;
            if self.hold >= HERO_HOLD_SEC {
                self.hold = 0.0;
                self.step = (self.step + 1) % PathProgram::CYCLE.len();
                let next = PathProgram::CYCLE[self.step];
                log::debug!("[hero] morphing to {}", next.name());
                self.ring.retarget(next);
            }
        }
        dom::sync_canvas_backing_size(&self.canvas, &self.canvas);
        self.draw();
    }

    fn draw(&mut self) {
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        let dpr = web::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0)
            .min(MAX_DEVICE_PIXEL_RATIO);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.set_fill_style_str(HERO_DOT_COLOR);
        for p in self.ring.positions() {
            let (x, y) = input::to_canvas(*p, w, h, HERO_FILL_RATIO);
            self.ctx.begin_path();
            _ = self.ctx.arc(x, y, HERO_DOT_RADIUS_PX * dpr, 0.0, TAU);
            self.ctx.fill();
        }
        self.drawn = true;
    }
}
