use crate::error::RingError;
use crate::paths::PathProgram;
use glam::Vec2;

#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
    }
}

/// Fixed-size ring of points morphing between path programs.
///
/// Particle `i` starts its move `i / count * stagger` seconds after a retarget
/// and takes `duration` seconds to arrive, so shapes sweep around the ring
/// instead of snapping.
#[derive(Clone, Debug)]
pub struct RingParticleSet {
    from: Vec<Vec2>,
    to: Vec<Vec2>,
    current: Vec<Vec2>,
    elapsed: f32,
    duration: f32,
    stagger: f32,
}

impl RingParticleSet {
    pub fn new(count: usize, initial: PathProgram, duration: f32, stagger: f32) -> Self {
        let points = initial.generate(count);
        Self {
            from: points.clone(),
            to: points.clone(),
            current: points,
            elapsed: f32::INFINITY,
            duration: duration.max(1e-3),
            stagger: stagger.max(0.0),
        }
    }

    pub fn count(&self) -> usize {
        self.current.len()
    }

    pub fn retarget(&mut self, program: PathProgram) {
        let points = program.generate(self.count());
        _ = self.retarget_points(points);
    }

    /// Starts a move from the current positions towards `points`.
    pub fn retarget_points(&mut self, points: Vec<Vec2>) -> Result<(), RingError> {
        if points.len() != self.count() {
            return Err(RingError::CountMismatch {
                expected: self.count(),
                got: points.len(),
            });
        }
        self.from.clone_from(&self.current);
        self.to = points;
        self.elapsed = 0.0;
        Ok(())
    }

    pub fn advance(&mut self, dt: f32) {
        if self.is_settled() {
            return;
        }
        self.elapsed += dt.max(0.0);
        let n = self.count() as f32;
        for (i, p) in self.current.iter_mut().enumerate() {
            let start = i as f32 / n * self.stagger;
            let t = ease_in_out_cubic((self.elapsed - start) / self.duration);
            *p = self.from[i].lerp(self.to[i], t);
        }
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.current
    }

    pub fn is_settled(&self) -> bool {
        self.elapsed >= self.duration + self.stagger
    }
}
