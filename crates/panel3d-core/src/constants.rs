// Shared tuning constants for viewers, the render scheduler and the gear extension.

// Camera framing
pub const CAMERA_FOV_DEG: f32 = 45.0;
pub const CAMERA_CLOSENESS: f32 = 0.95; // <1 frames the model slightly tighter than a perfect fit
pub const CAMERA_ELEVATION: f32 = 0.35; // y component of the unnormalized view direction on fit
pub const CAMERA_DEFAULT_DISTANCE: f32 = 5.0; // before any model is attached
pub const CONTROLS_MIN_DISTANCE_FACTOR: f32 = 0.4;
pub const CONTROLS_MAX_DISTANCE_FACTOR: f32 = 4.0;
pub const CAMERA_NEAR_FACTOR: f32 = 0.01; // near plane as a fraction of fit distance
pub const CAMERA_FAR_FACTOR: f32 = 100.0; // far plane as a multiple of fit distance

// Orbit controls
pub const ORBIT_DAMPING_FACTOR: f32 = 0.05;
pub const ORBIT_MIN_POLAR: f32 = 0.05;
pub const ORBIT_MAX_POLAR: f32 = std::f32::consts::PI - 0.05;
pub const ORBIT_ROTATE_SPEED: f32 = 1.0;
pub const ORBIT_ZOOM_STEP: f32 = 0.95; // radius multiplier per wheel notch towards the target
pub const AUTO_ROTATE_SPEED: f32 = 2.0; // 30 s per revolution

// Interaction
pub const AUTO_ROTATE_RESUME_SEC: f64 = 1.8;

// Lighting and shadows
pub const SHADOW_MAP_SIZE: u32 = 2048;
pub const SHADOW_BIAS: f32 = 0.0005;
pub const HEMI_SKY_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const HEMI_GROUND_COLOR: [f32; 3] = [0.27, 0.27, 0.3];
pub const HEMI_INTENSITY: f32 = 0.9;
pub const DIR_LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DIR_LIGHT_INTENSITY: f32 = 1.2;
pub const DIR_LIGHT_DIRECTION: [f32; 3] = [-0.5, -1.0, -0.35]; // direction the light travels

// Ground shadow catcher
pub const GROUND_SIZE_FACTOR: f32 = 4.0;
pub const GROUND_OFFSET_FACTOR: f32 = 0.001; // gap below the lowest point, as a fraction of size
pub const GROUND_DEFAULT_OPACITY: f32 = 0.25;

// Star field
pub const STARS_DEFAULT_COUNT: usize = 900;
pub const STARS_MAX_COUNT: usize = 20_000; // larger counts are treated as malformed
pub const STARS_DEFAULT_SIZE: f32 = 0.8;
pub const STARS_DEFAULT_RADIUS: f32 = 50.0;
pub const STARS_INNER_RADIUS_RATIO: f32 = 0.6; // stars fill the shell [0.6 r, r]
pub const STARS_SPIN_Y_RAD_PER_SEC: f32 = 0.01;
pub const STARS_SPIN_X_RAD_PER_SEC: f32 = 0.002;

// Gear extension defaults
pub const GEAR_DEFAULT_COUNT: usize = 12;
pub const GEAR_DEFAULT_TOLERANCE: f32 = 0.18;
pub const GEAR_DEFAULT_FLATNESS: f32 = 1.4;
pub const GEAR_DEFAULT_SPEED: f32 = 2.0; // rad/s for the largest selected part
pub const GEAR_FALLBACK_PATTERN: &str = "(?i)gear|cog|pinion|wheel";

// Tone mapping
pub const DEFAULT_EXPOSURE: f32 = 1.0;
