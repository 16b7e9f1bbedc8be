//! Closed 2D curves sampled into a fixed number of points.
//!
//! Every program fits roughly inside the unit square centred on the origin,
//! with +y up. Callers scale to their canvas.

use glam::Vec2;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathProgram {
    Circle,
    Ellipse { rx: f32, ry: f32 },
    Heart,
    /// `points` tips alternating with an inner radius; sampled by arc length.
    Star { points: u32, inner: f32 },
    Lissajous { a: u32, b: u32, phase: f32 },
    /// Exponent `n`: 2 is a circle, large values approach a square.
    Superellipse { n: f32 },
    Lemniscate,
    /// Hypotrochoid with fixed ring `big_r`, rolling ring `small_r`, pen offset `d`.
    Spirograph { big_r: u32, small_r: u32, d: f32 },
}

impl PathProgram {
    /// The cycle the hero ring steps through.
    pub const CYCLE: [PathProgram; 8] = [
        PathProgram::Circle,
        PathProgram::Heart,
        PathProgram::Star {
            points: 5,
            inner: 0.45,
        },
        PathProgram::Lissajous {
            a: 3,
            b: 2,
            phase: std::f32::consts::FRAC_PI_2,
        },
        PathProgram::Superellipse { n: 4.0 },
        PathProgram::Lemniscate,
        PathProgram::Spirograph {
            big_r: 5,
            small_r: 3,
            d: 2.0,
        },
        PathProgram::Ellipse { rx: 1.0, ry: 0.6 },
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PathProgram::Circle => "circle",
            PathProgram::Ellipse { .. } => "ellipse",
            PathProgram::Heart => "heart",
            PathProgram::Star { .. } => "star",
            PathProgram::Lissajous { .. } => "lissajous",
            PathProgram::Superellipse { .. } => "superellipse",
            PathProgram::Lemniscate => "lemniscate",
            PathProgram::Spirograph { .. } => "spirograph",
        }
    }

    /// Exactly `n` points in curve order.
    pub fn generate(&self, n: usize) -> Vec<Vec2> {
        if n == 0 {
            return Vec::new();
        }
        match *self {
            PathProgram::Star { points, inner } => star(n, points.max(2), inner),
            PathProgram::Spirograph { big_r, small_r, d } => spirograph(n, big_r, small_r, d),
            _ => (0..n)
                .map(|i| self.at(i as f32 / n as f32 * TAU))
                .collect(),
        }
    }

    fn at(&self, t: f32) -> Vec2 {
        let (s, c) = t.sin_cos();
        match *self {
            PathProgram::Circle => Vec2::new(c, s),
            PathProgram::Ellipse { rx, ry } => Vec2::new(rx * c, ry * s),
            PathProgram::Heart => {
                let x = 16.0 * s.powi(3);
                let y = 13.0 * c - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
                Vec2::new(x, y) / 17.0
            }
            PathProgram::Lissajous { a, b, phase } => {
                Vec2::new((a as f32 * t + phase).sin(), (b as f32 * t).sin())
            }
            PathProgram::Superellipse { n } => {
                let e = 2.0 / n.max(0.1);
                Vec2::new(c.signum() * c.abs().powf(e), s.signum() * s.abs().powf(e))
            }
            PathProgram::Lemniscate => {
                let k = 1.0 + s * s;
                Vec2::new(c / k, s * c / k)
            }
            // Handled in generate.
            PathProgram::Star { .. } | PathProgram::Spirograph { .. } => Vec2::new(c, s),
        }
    }
}

fn star(n: usize, points: u32, inner: f32) -> Vec<Vec2> {
    let k = (points * 2) as usize;
    let verts: Vec<Vec2> = (0..k)
        .map(|i| {
            let r = if i % 2 == 0 { 1.0 } else { inner };
            let a = std::f32::consts::FRAC_PI_2 + i as f32 / k as f32 * TAU;
            Vec2::new(a.cos(), a.sin()) * r
        })
        .collect();
    let lens: Vec<f32> = (0..k)
        .map(|i| verts[i].distance(verts[(i + 1) % k]))
        .collect();
    let perimeter: f32 = lens.iter().sum();

    let mut out = Vec::with_capacity(n);
    let mut seg = 0;
    let mut seg_start = 0.0;
    for i in 0..n {
        let s = i as f32 / n as f32 * perimeter;
        while seg + 1 < k && s > seg_start + lens[seg] {
            seg_start += lens[seg];
            seg += 1;
        }
        let f = if lens[seg] > 0.0 {
            ((s - seg_start) / lens[seg]).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(verts[seg].lerp(verts[(seg + 1) % k], f));
    }
    out
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn spirograph(n: usize, big_r: u32, small_r: u32, d: f32) -> Vec<Vec2> {
    let big_r = big_r.max(1);
    let small_r = small_r.clamp(1, big_r);
    let (rr, r) = (big_r as f32, small_r as f32);
    // Curve closes after small_r / gcd turns of the rolling ring.
    let period = TAU * (small_r / gcd(big_r, small_r)) as f32;
    let scale = ((rr - r).abs() + d.abs()).max(1e-6);
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32 * period;
            let q = (rr - r) / r * t;
            Vec2::new(
                (rr - r) * t.cos() + d * q.cos(),
                (rr - r) * t.sin() - d * q.sin(),
            ) / scale
        })
        .collect()
}
