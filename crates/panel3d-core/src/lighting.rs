use crate::config::GroundConfig;
use crate::constants::*;
use crate::scene::Aabb;
use glam::{Mat4, Vec3};

/// Hemisphere fill plus one directional key light, optionally shadow casting.
#[derive(Clone, Debug)]
pub struct LightRig {
    pub hemi_sky: [f32; 3],
    pub hemi_ground: [f32; 3],
    pub hemi_intensity: f32,
    pub key_color: [f32; 3],
    pub key_intensity: f32,
    /// Direction the key light travels, normalised.
    pub key_direction: Vec3,
    pub shadows: bool,
    pub shadow_map_size: u32,
    pub shadow_bias: f32,
    pub focus: Vec3,
    pub extent: f32,
}

impl LightRig {
    pub fn new(shadows: bool) -> Self {
        Self {
            hemi_sky: HEMI_SKY_COLOR,
            hemi_ground: HEMI_GROUND_COLOR,
            hemi_intensity: HEMI_INTENSITY,
            key_color: DIR_LIGHT_COLOR,
            key_intensity: DIR_LIGHT_INTENSITY,
            key_direction: Vec3::from_array(DIR_LIGHT_DIRECTION).normalize(),
            shadows,
            shadow_map_size: SHADOW_MAP_SIZE,
            shadow_bias: SHADOW_BIAS,
            focus: Vec3::ZERO,
            extent: 1.0,
        }
    }

    /// Sizes the shadow frustum so it covers the model and its immediate surroundings.
    pub fn fit_to(&mut self, bounds: &Aabb) {
        self.focus = bounds.center();
        self.extent = bounds.diagonal().max(1e-3);
    }

    pub fn light_view_proj(&self) -> Mat4 {
        let e = self.extent;
        let eye = self.focus - self.key_direction * e * 2.0;
        let up = if self.key_direction.abs_diff_eq(Vec3::Y, 1e-3)
            || self.key_direction.abs_diff_eq(Vec3::NEG_Y, 1e-3)
        {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, self.focus, up);
        let proj = Mat4::orthographic_rh(-e, e, -e, e, e * 0.01, e * 4.0);
        proj * view
    }
}

/// Shadow-only plane just below the model.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundPlane {
    pub y: f32,
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl GroundPlane {
    pub fn under(bounds: &Aabb, config: &GroundConfig) -> Self {
        let size = bounds.diagonal() * GROUND_SIZE_FACTOR;
        Self {
            y: bounds.min.y - size * GROUND_OFFSET_FACTOR,
            size,
            color: config.color.to_linear(),
            opacity: config.opacity,
        }
    }
}
