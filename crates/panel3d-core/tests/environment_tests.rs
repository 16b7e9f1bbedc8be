use glam::Vec3;
use panel3d_core::environment::{equirect_direction, Environment};
use panel3d_core::LoadError;

fn uniform(width: u32, height: u32, value: f32) -> Vec<f32> {
    vec![value; (width * height * 3) as usize]
}

#[test]
fn uniform_map_gives_uniform_ambient() {
    let env = Environment::from_equirect(16, 8, &uniform(16, 8, 0.5), 1.0, false).unwrap();
    for face in env.ambient.faces {
        for ch in face {
            assert!((ch - 0.5).abs() < 1e-4);
        }
    }
    let s = env.ambient.sample(Vec3::new(1.0, 1.0, 0.0).normalize());
    assert!((s - Vec3::splat(0.5)).length() < 1e-4);
    assert!(env.background.is_none());
}

#[test]
fn bright_sky_lights_upward_faces() {
    let (w, h) = (32, 16);
    let mut rgb = Vec::new();
    for y in 0..h {
        let v = if y < h / 2 { 2.0 } else { 0.1 };
        for _ in 0..w {
            rgb.extend([v, v, v]);
        }
    }
    let env = Environment::from_equirect(w, h, &rgb, 1.0, false).unwrap();
    assert!(env.ambient.faces[2][0] > env.ambient.faces[3][0] * 5.0);
    assert!(env.ambient.sample(Vec3::Y).x > env.ambient.sample(Vec3::NEG_Y).x);
}

#[test]
fn background_is_capped_and_tone_mapped() {
    let env = Environment::from_equirect(3000, 2, &uniform(3000, 2, 0.18), 1.0, true).unwrap();
    let bg = env.background.unwrap();
    assert_eq!((bg.width, bg.height), (2048, 1));
    assert_eq!(bg.rgba.len(), 2048 * 4);
    assert!(bg.rgba.chunks(4).all(|px| px[3] == 255 && px[0] == px[1]));

    let dark = Environment::from_equirect(4, 2, &uniform(4, 2, 0.18), 0.0, true).unwrap();
    assert!(dark.background.unwrap().rgba.chunks(4).all(|px| px[0] == 0));
}

#[test]
fn short_or_empty_data_is_rejected() {
    assert!(matches!(
        Environment::from_equirect(4, 2, &[0.0; 5], 1.0, false),
        Err(LoadError::Environment(_))
    ));
    assert!(matches!(
        Environment::from_equirect(0, 2, &[], 1.0, false),
        Err(LoadError::Environment(_))
    ));
}

#[test]
fn equirect_centre_faces_positive_x() {
    assert!((equirect_direction(0.5, 0.5) - Vec3::X).length() < 1e-6);
    assert!((equirect_direction(0.25, 0.5) - Vec3::NEG_Z).length() < 1e-6);
    assert!((equirect_direction(0.3, 0.0) - Vec3::Y).length() < 1e-6);
}
