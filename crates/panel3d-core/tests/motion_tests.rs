use glam::Vec2;
use panel3d_core::paths::PathProgram;
use panel3d_core::ring::{ease_in_out_cubic, RingParticleSet};
use panel3d_core::RingError;

#[test]
fn every_program_yields_exactly_n_points() {
    for program in PathProgram::CYCLE {
        for n in [0, 1, 3, 7, 64, 257] {
            let pts = program.generate(n);
            assert_eq!(pts.len(), n, "{} with {}", program.name(), n);
            assert!(pts.iter().all(|p| p.is_finite()), "{}", program.name());
        }
    }
}

#[test]
fn programs_fit_the_unit_square() {
    for program in PathProgram::CYCLE {
        for p in program.generate(360) {
            assert!(
                p.x.abs() <= 1.0 + 1e-4 && p.y.abs() <= 1.0 + 1e-4,
                "{} escaped at {:?}",
                program.name(),
                p
            );
        }
    }
}

#[test]
fn circle_points_sit_on_the_unit_circle() {
    let pts = PathProgram::Circle.generate(16);
    assert!(pts.iter().all(|p| (p.length() - 1.0).abs() < 1e-5));
    assert!((pts[0] - Vec2::X).length() < 1e-6);
    assert!((pts[4] - Vec2::Y).length() < 1e-5);
}

#[test]
fn star_samples_stay_between_inner_radius_and_tips() {
    let star = PathProgram::Star {
        points: 5,
        inner: 0.4,
    };
    let pts = star.generate(200);
    // The closest point of an edge to the centre is inside the inner radius,
    // but never by more than the edge geometry allows.
    assert!(pts.iter().all(|p| p.length() <= 1.0 + 1e-5 && p.length() > 0.3));
    // Starts at the top tip.
    assert!((pts[0] - Vec2::Y).length() < 1e-5);
}

#[test]
fn star_sampling_is_even_along_the_outline() {
    let pts = PathProgram::Star {
        points: 4,
        inner: 0.5,
    }
    .generate(400);
    let steps: Vec<f32> = pts.windows(2).map(|w| w[0].distance(w[1])).collect();
    let max = steps.iter().cloned().fold(0.0, f32::max);
    // Only steps that cut one of the 8 corners come out shorter.
    let even = steps.iter().filter(|s| (max - **s) < max * 1e-3).count();
    assert!(even >= steps.len() - 8, "{} of {}", even, steps.len());
}

#[test]
fn spirograph_closes_on_itself() {
    let program = PathProgram::Spirograph {
        big_r: 5,
        small_r: 3,
        d: 2.0,
    };
    let pts = program.generate(600);
    let gap = pts[pts.len() - 1].distance(pts[0]);
    let step = pts[0].distance(pts[1]);
    assert!(gap < step * 2.0);
}

#[test]
fn easing_endpoints_and_midpoint() {
    assert_eq!(ease_in_out_cubic(0.0), 0.0);
    assert_eq!(ease_in_out_cubic(0.5), 0.5);
    assert_eq!(ease_in_out_cubic(1.0), 1.0);
    assert_eq!(ease_in_out_cubic(-3.0), 0.0);
    assert_eq!(ease_in_out_cubic(7.0), 1.0);
    let mut last = 0.0;
    for i in 1..=100 {
        let v = ease_in_out_cubic(i as f32 / 100.0);
        assert!(v >= last);
        last = v;
    }
}

#[test]
fn ring_starts_settled_on_its_initial_shape() {
    let ring = RingParticleSet::new(24, PathProgram::Circle, 1.0, 0.5);
    assert!(ring.is_settled());
    assert_eq!(ring.count(), 24);
    assert_eq!(ring.positions(), PathProgram::Circle.generate(24).as_slice());
}

#[test]
fn ring_rejects_a_mismatched_path() {
    let mut ring = RingParticleSet::new(12, PathProgram::Circle, 1.0, 0.5);
    let err = ring.retarget_points(vec![Vec2::ZERO; 3]).unwrap_err();
    assert_eq!(
        err,
        RingError::CountMismatch {
            expected: 12,
            got: 3
        }
    );
    assert!(ring.is_settled());
}

#[test]
fn staggered_particles_leave_in_ring_order() {
    let mut ring = RingParticleSet::new(12, PathProgram::Circle, 1.0, 0.5);
    let start = ring.positions().to_vec();
    ring.retarget(PathProgram::Heart);
    ring.advance(0.25);

    let moved: Vec<f32> = ring
        .positions()
        .iter()
        .zip(&start)
        .map(|(p, s)| p.distance(*s))
        .collect();
    assert!(moved[0] > 0.0);
    // Particle 6 starts at 0.25 s and has not moved yet.
    assert_eq!(moved[6], 0.0);
    assert_eq!(moved[11], 0.0);
    assert!(!ring.is_settled());
}

#[test]
fn ring_settles_on_the_target_after_duration_plus_stagger() {
    let mut ring = RingParticleSet::new(12, PathProgram::Circle, 1.0, 0.5);
    ring.retarget(PathProgram::Heart);
    for _ in 0..14 {
        ring.advance(0.1);
        assert!(!ring.is_settled());
    }
    ring.advance(0.2);
    assert!(ring.is_settled());
    let target = PathProgram::Heart.generate(12);
    for (p, t) in ring.positions().iter().zip(&target) {
        assert!(p.distance(*t) < 1e-5);
    }
}

#[test]
fn retarget_mid_flight_starts_from_current_positions() {
    let mut ring = RingParticleSet::new(8, PathProgram::Circle, 1.0, 0.0);
    ring.retarget(PathProgram::Lemniscate);
    ring.advance(0.3);
    let snapshot = ring.positions().to_vec();

    ring.retarget(PathProgram::Circle);
    ring.advance(0.0);
    assert_eq!(ring.positions(), snapshot.as_slice());
}
