use crate::config::StarConfig;
use crate::constants::*;
use glam::{Mat4, Vec3};
use rand::prelude::*;

/// Decorative point shell around the model, slowly spinning.
#[derive(Clone, Debug)]
pub struct StarField {
    pub positions: Vec<Vec3>,
    pub color: [f32; 3],
    pub size: f32,
    pub rotation: Vec3,
}

impl StarField {
    /// Points uniformly distributed over directions, radii in the outer shell.
    pub fn generate(config: &StarConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let inner = config.radius * STARS_INNER_RADIUS_RATIO;
        let positions = (0..config.count)
            .map(|_| {
                let u: f32 = rng.gen_range(-1.0..=1.0);
                let a: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
                let s = (1.0 - u * u).max(0.0).sqrt();
                let r = rng.gen_range(inner..=config.radius);
                Vec3::new(s * a.cos(), u, s * a.sin()) * r
            })
            .collect();
        Self {
            positions,
            color: config.color.to_linear(),
            size: config.size,
            rotation: Vec3::ZERO,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.rotation.y += STARS_SPIN_Y_RAD_PER_SEC * dt;
        self.rotation.x += STARS_SPIN_X_RAD_PER_SEC * dt;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation.y) * Mat4::from_rotation_x(self.rotation.x)
    }
}
