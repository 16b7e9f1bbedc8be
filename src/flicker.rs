use crate::constants::*;
use crate::dom;
use panel3d_core::noise::{noise_frame, NoiseSpec};
use wasm_bindgen::Clamped;
use web_sys as web;

/// Low-alpha film grain redrawn at a fixed rate, stretched over its canvas by CSS.
pub struct Flicker {
    ctx: web::CanvasRenderingContext2d,
    spec: NoiseSpec,
    frame: u64,
    since_draw: f32,
    animate: bool,
}

impl Flicker {
    pub fn find(document: &web::Document, animate: bool) -> Option<Self> {
        let canvas = dom::query_canvas(document, FLICKER_SELECTOR)?;
        canvas.set_width(FLICKER_SIZE);
        canvas.set_height(FLICKER_SIZE);
        let ctx = dom::context_2d(&canvas)?;
        let spec = NoiseSpec {
            width: FLICKER_SIZE,
            height: FLICKER_SIZE,
            cell: FLICKER_CELL,
            ..NoiseSpec::default()
        };
        let mut flicker = Self {
            ctx,
            spec,
            frame: 0,
            since_draw: 0.0,
            animate,
        };
        flicker.draw();
        Some(flicker)
    }

    pub fn frame(&mut self, dt: f32) {
        if !self.animate {
            return;
        }
        self.since_draw += dt;
        let period = 1.0 / FLICKER_FPS;
        if self.since_draw < period {
            return;
        }
        self.since_draw %= period;
        self.frame += 1;
        self.draw();
    }

    fn draw(&mut self) {
        let noise = noise_frame(&self.spec, self.frame);
        let rgba = noise.to_rgba(FLICKER_ALPHA);
        match web::ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&rgba),
            noise.width,
            noise.height,
        ) {
            Ok(image) => {
                _ = self.ctx.put_image_data(&image, 0.0, 0.0);
            }
            Err(e) => log::debug!("[flicker] ImageData failed: {:?}", e),
        }
    }
}
