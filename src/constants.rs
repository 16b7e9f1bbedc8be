/// Browser-side tuning: DOM hooks, observer thresholds, pointer scaling and
/// the two decorative canvas effects.
///
/// Viewer behaviour (camera, lighting, gears) is tuned in
/// `panel3d_core::constants`; only values that touch the page live here.
// Container discovery
pub const CONTAINER_SELECTOR: &str = "[data-panel3d]";
pub const DATA_PREFIX: &str = "data-";

// Drawing buffer never exceeds this many device pixels per CSS pixel
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

// A container counts as visible once this share of it intersects the viewport
pub const INTERSECTION_THRESHOLD: f64 = 0.01;

// Wheel normalisation (WheelEvent.deltaMode: 0 pixel, 1 line, 2 page)
pub const WHEEL_LINE_PX: f64 = 16.0;
pub const WHEEL_PAGE_PX: f64 = 800.0;
pub const WHEEL_NOTCH_PX: f64 = 100.0; // one dolly step per notch
pub const WHEEL_MAX_NOTCHES: f64 = 5.0; // per event, so trackpad bursts stay bounded

// Hero ring particles
pub const HERO_SELECTOR: &str = "canvas[data-hero-ring]";
pub const HERO_PARTICLES: usize = 160;
pub const HERO_MORPH_SEC: f32 = 1.6;
pub const HERO_STAGGER_SEC: f32 = 0.8;
pub const HERO_HOLD_SEC: f32 = 2.5; // pause on each settled shape
pub const HERO_FILL_RATIO: f64 = 0.42; // ring radius as a share of the shorter canvas side
pub const HERO_DOT_RADIUS_PX: f64 = 2.0;
pub const HERO_DOT_COLOR: &str = "rgba(255, 255, 255, 0.85)";

// Flicker overlay
pub const FLICKER_SELECTOR: &str = "canvas[data-flicker]";
pub const FLICKER_FPS: f32 = 12.0;
pub const FLICKER_ALPHA: u8 = 28;
pub const FLICKER_SIZE: u32 = 128;
pub const FLICKER_CELL: u32 = 16;
