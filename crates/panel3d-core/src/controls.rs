//! Orbit-style camera controls and the perspective camera they drive.

use crate::constants::*;
use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Right-handed perspective camera.
#[derive(Clone, Debug)]
pub struct Camera {
    pub fovy_radians: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fovy_radians: CAMERA_FOV_DEG.to_radians(),
            aspect: 1.0,
            znear: 0.01,
            zfar: 1000.0,
        }
    }
}

impl Camera {
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect.max(1e-3), self.znear, self.zfar)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Distance at which a sphere of diameter `size` fills the vertical field of view,
    /// pulled in by the closeness factor and an optional zoom.
    pub fn fit_distance(&self, size: f32, zoom: f32) -> f32 {
        let base = (size * 0.5) / (self.fovy_radians * 0.5).tan();
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        base * CAMERA_CLOSENESS / zoom
    }
}

/// Orbits the eye around `target` on a sphere, with damped input.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub delta_theta: f32,
    pub delta_phi: f32,
    pub scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        let mut c = Self {
            target: Vec3::ZERO,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar: ORBIT_MIN_POLAR,
            max_polar: ORBIT_MAX_POLAR,
            enable_damping: true,
            damping_factor: ORBIT_DAMPING_FACTOR,
            radius: CAMERA_DEFAULT_DISTANCE,
            theta: 0.0,
            phi: PI * 0.5,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        };
        c.set_eye(Vec3::new(0.0, 0.0, CAMERA_DEFAULT_DISTANCE));
        c
    }
}

impl OrbitControls {
    /// Places the eye, deriving the spherical coordinates around the target.
    pub fn set_eye(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        self.radius = offset.length().max(1e-6);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / self.radius).clamp(-1.0, 1.0).acos();
        self.phi = self.phi.clamp(self.min_polar, self.max_polar);
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn polar(&self) -> f32 {
        self.phi
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_phi * self.theta.sin(),
                    self.phi.cos(),
                    sin_phi * self.theta.cos(),
                )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Pointer drag in pixels, normalised by the element height.
    pub fn drag(&mut self, dx: f32, dy: f32, height: f32) {
        let h = height.max(1.0);
        self.rotate_left(TAU * dx / h * ORBIT_ROTATE_SPEED);
        self.rotate_up(TAU * dy / h * ORBIT_ROTATE_SPEED);
    }

    /// Multiplies the pending radius scale; `< 1` moves towards the target.
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Idle spin, proportional to elapsed time.
    pub fn auto_rotate(&mut self, dt: f32) {
        self.theta -= TAU / 60.0 * AUTO_ROTATE_SPEED * dt;
    }

    /// Applies pending input, clamps, and decays the deltas when damping is on.
    /// Returns the new eye position.
    pub fn update(&mut self) -> Vec3 {
        let k = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        self.theta += self.delta_theta * k;
        self.phi = (self.phi + self.delta_phi * k).clamp(self.min_polar, self.max_polar);
        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;
        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.eye()
    }
}
