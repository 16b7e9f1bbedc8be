use glam::Vec2;
use panel3d_core::constants::ORBIT_ZOOM_STEP;

/// Tracks one captured pointer between down and up.
#[derive(Default, Clone, Copy, Debug)]
pub struct DragState {
    pub pointer: Option<i32>,
    pub last: Vec2,
}

impl DragState {
    pub fn begin(&mut self, pointer: i32, at: Vec2) {
        self.pointer = Some(pointer);
        self.last = at;
    }

    /// Movement since the previous event, or `None` for pointers we are not tracking.
    pub fn move_to(&mut self, pointer: i32, at: Vec2) -> Option<Vec2> {
        if self.pointer != Some(pointer) {
            return None;
        }
        let delta = at - self.last;
        self.last = at;
        Some(delta)
    }

    /// Returns true if this ended the active drag.
    pub fn end(&mut self, pointer: i32) -> bool {
        if self.pointer == Some(pointer) {
            self.pointer = None;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.pointer.is_some()
    }
}

/// Only the main button orbits.
pub fn is_primary_button(button: i16) -> bool {
    button == 0
}

/// Converts a wheel delta to pixels given `WheelEvent.deltaMode`.
#[inline]
pub fn wheel_delta_px(delta_y: f64, delta_mode: u32, line_px: f64, page_px: f64) -> f64 {
    match delta_mode {
        1 => delta_y * line_px,
        2 => delta_y * page_px,
        _ => delta_y,
    }
}

/// Radius multiplier for a wheel delta in pixels: scrolling up (negative)
/// moves towards the target.
#[inline]
pub fn wheel_dolly_factor(delta_px: f64, notch_px: f64, max_notches: f64) -> f32 {
    if !delta_px.is_finite() || notch_px <= 0.0 {
        return 1.0;
    }
    let notches = (delta_px / notch_px).clamp(-max_notches, max_notches);
    ORBIT_ZOOM_STEP.powf(-notches as f32)
}

/// Drawing-buffer size for a CSS box, with the device pixel ratio capped.
#[inline]
pub fn backing_size(css_width: f64, css_height: f64, dpr: f64, max_dpr: f64) -> (u32, u32) {
    let dpr = if dpr.is_finite() && dpr > 0.0 {
        dpr.min(max_dpr)
    } else {
        1.0
    };
    let w = (css_width.max(0.0) * dpr).round() as u32;
    let h = (css_height.max(0.0) * dpr).round() as u32;
    (w.max(1), h.max(1))
}

/// Maps unit-square path points into a canvas, +y up, centred.
#[inline]
pub fn to_canvas(p: Vec2, width: f64, height: f64, fill: f64) -> (f64, f64) {
    let r = width.min(height) * fill;
    (width * 0.5 + p.x as f64 * r, height * 0.5 - p.y as f64 * r)
}
