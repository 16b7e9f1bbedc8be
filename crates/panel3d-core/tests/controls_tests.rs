use glam::Vec3;
use panel3d_core::constants::AUTO_ROTATE_SPEED;
use panel3d_core::controls::{Camera, OrbitControls};
use std::f32::consts::TAU;

#[test]
fn set_eye_round_trips_through_spherical_coordinates() {
    let mut c = OrbitControls::default();
    let eye = Vec3::new(1.0, 2.0, 3.0);
    c.set_eye(eye);
    assert!((c.eye() - eye).length() < 1e-5);
    assert!((c.distance() - eye.length()).abs() < 1e-5);
}

#[test]
fn polar_angle_is_clamped() {
    let mut c = OrbitControls {
        enable_damping: false,
        ..Default::default()
    };
    c.rotate_up(10.0);
    c.update();
    assert_eq!(c.polar(), c.min_polar);

    c.rotate_up(-10.0);
    c.update();
    assert_eq!(c.polar(), c.max_polar);
    assert!(c.eye().is_finite());
}

#[test]
fn dolly_is_clamped_to_distance_limits() {
    let mut c = OrbitControls::default();
    c.min_distance = 2.0;
    c.max_distance = 8.0;

    c.dolly(0.01);
    c.update();
    assert_eq!(c.distance(), 2.0);

    c.dolly(1000.0);
    c.update();
    assert_eq!(c.distance(), 8.0);
}

#[test]
fn invalid_dolly_factors_are_ignored() {
    let mut c = OrbitControls::default();
    let d = c.distance();
    c.dolly(0.0);
    c.dolly(-1.0);
    c.dolly(f32::NAN);
    c.update();
    assert_eq!(c.distance(), d);
}

#[test]
fn damping_spreads_input_over_frames() {
    let mut c = OrbitControls::default();
    let start = c.azimuth();
    c.rotate_left(1.0);

    c.update();
    let first = start - c.azimuth();
    assert!((first - c.damping_factor).abs() < 1e-6);

    c.update();
    let second = start - c.azimuth() - first;
    assert!(second < first && second > 0.0);

    for _ in 0..1000 {
        c.update();
    }
    assert!((start - c.azimuth() - 1.0).abs() < 1e-3);
}

#[test]
fn without_damping_input_applies_once() {
    let mut c = OrbitControls {
        enable_damping: false,
        ..Default::default()
    };
    let start = c.azimuth();
    c.rotate_left(0.5);
    c.update();
    assert!((start - c.azimuth() - 0.5).abs() < 1e-6);
    c.update();
    assert!((start - c.azimuth() - 0.5).abs() < 1e-6);
}

#[test]
fn drag_across_full_height_is_one_turn() {
    let mut c = OrbitControls {
        enable_damping: false,
        ..Default::default()
    };
    let start = c.azimuth();
    c.drag(600.0, 0.0, 600.0);
    c.update();
    assert!((start - c.azimuth() - TAU).abs() < 1e-4);
}

#[test]
fn auto_rotate_is_time_based() {
    let mut c = OrbitControls::default();
    let start = c.azimuth();
    c.auto_rotate(0.5);
    c.auto_rotate(0.5);
    assert!((start - c.azimuth() - TAU / 60.0 * AUTO_ROTATE_SPEED).abs() < 1e-5);
}

#[test]
fn fit_distance_ignores_bad_zoom() {
    let cam = Camera::default();
    let base = cam.fit_distance(2.0, 1.0);
    assert_eq!(cam.fit_distance(2.0, 0.0), base);
    assert_eq!(cam.fit_distance(2.0, f32::NAN), base);
    assert!((cam.fit_distance(2.0, 2.0) - base / 2.0).abs() < 1e-6);
}

#[test]
fn viewport_sets_aspect_and_ignores_empty_sizes() {
    let mut cam = Camera::default();
    cam.set_viewport(800, 400);
    assert_eq!(cam.aspect, 2.0);
    cam.set_viewport(0, 400);
    assert_eq!(cam.aspect, 2.0);
}
