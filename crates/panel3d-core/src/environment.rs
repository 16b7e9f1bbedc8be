//! Image-based lighting from an equirectangular HDR map.
//!
//! The map is reduced to a six-direction ambient cube for diffuse lighting and,
//! when requested, a tone-mapped 8-bit copy that the renderer draws as the
//! visible background.

use crate::config::linear_to_srgb;
use crate::error::LoadError;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

const MAX_AMBIENT_SAMPLES: usize = 1 << 16;
const MAX_BACKGROUND_WIDTH: u32 = 2048;

/// Cosine-weighted mean radiance seen by a surface facing each axis:
/// +X, -X, +Y, -Y, +Z, -Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientCube {
    pub faces: [[f32; 3]; 6],
}

impl AmbientCube {
    pub const AXES: [Vec3; 6] = [
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];

    /// Radiance for a normal, blending the three faces it leans towards.
    pub fn sample(&self, n: Vec3) -> Vec3 {
        let n2 = n * n;
        let pick = |pos: usize, neg: usize, s: f32| {
            Vec3::from_array(if s >= 0.0 {
                self.faces[pos]
            } else {
                self.faces[neg]
            })
        };
        pick(0, 1, n.x) * n2.x + pick(2, 3, n.y) * n2.y + pick(4, 5, n.z) * n2.z
    }
}

#[derive(Clone, Debug)]
pub struct LdrImage {
    pub width: u32,
    pub height: u32,
    /// sRGB encoded RGBA8.
    pub rgba: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Environment {
    pub ambient: AmbientCube,
    pub background: Option<LdrImage>,
}

/// Direction for equirect texture coordinates, matching the background shader.
#[inline]
pub fn equirect_direction(u: f32, v: f32) -> Vec3 {
    let lon = (u - 0.5) * TAU;
    let lat = (0.5 - v) * PI;
    Vec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin())
}

/// Narkowicz ACES filmic fit.
#[inline]
pub fn aces_film(x: f32) -> f32 {
    ((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)).clamp(0.0, 1.0)
}

impl Environment {
    /// `rgb` holds `width * height` linear RGB triples, row 0 at the top.
    pub fn from_equirect(
        width: u32,
        height: u32,
        rgb: &[f32],
        exposure: f32,
        with_background: bool,
    ) -> Result<Self, LoadError> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || rgb.len() < w * h * 3 {
            return Err(LoadError::Environment(format!(
                "expected {}x{} RGB texels, got {} floats",
                width,
                height,
                rgb.len()
            )));
        }
        let texel = |x: usize, y: usize| {
            let i = (y * w + x) * 3;
            Vec3::new(rgb[i], rgb[i + 1], rgb[i + 2])
        };

        let stride = ((w * h) as f32 / MAX_AMBIENT_SAMPLES as f32).sqrt().ceil().max(1.0) as usize;
        let mut sums = [Vec3::ZERO; 6];
        let mut weights = [0.0_f32; 6];
        for y in (0..h).step_by(stride) {
            let v = (y as f32 + 0.5) / h as f32;
            // Rows near the poles cover less solid angle.
            let solid = ((0.5 - v) * PI).cos();
            for x in (0..w).step_by(stride) {
                let u = (x as f32 + 0.5) / w as f32;
                let dir = equirect_direction(u, v);
                let radiance = texel(x, y);
                for (face, axis) in AmbientCube::AXES.iter().enumerate() {
                    let c = dir.dot(*axis);
                    if c > 0.0 {
                        sums[face] += radiance * c * solid;
                        weights[face] += c * solid;
                    }
                }
            }
        }
        let mut faces = [[0.0; 3]; 6];
        for i in 0..6 {
            if weights[i] > 0.0 {
                faces[i] = (sums[i] / weights[i]).to_array();
            }
        }

        let background = with_background.then(|| {
            let out_w = width.min(MAX_BACKGROUND_WIDTH).max(1);
            let out_h = ((height as u64 * out_w as u64) / width as u64).max(1) as u32;
            let mut rgba = Vec::with_capacity((out_w * out_h * 4) as usize);
            for oy in 0..out_h {
                let sy = ((oy as u64 * h as u64) / out_h as u64) as usize;
                for ox in 0..out_w {
                    let sx = ((ox as u64 * w as u64) / out_w as u64) as usize;
                    let c = texel(sx, sy) * exposure;
                    for ch in [c.x, c.y, c.z] {
                        rgba.push((linear_to_srgb(aces_film(ch)) * 255.0 + 0.5) as u8);
                    }
                    rgba.push(255);
                }
            }
            LdrImage {
                width: out_w,
                height: out_h,
                rgba,
            }
        });

        Ok(Self {
            ambient: AmbientCube { faces },
            background,
        })
    }
}
