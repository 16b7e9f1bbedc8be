//! Tileable grayscale noise for the flicker overlay.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSpec {
    pub width: u32,
    pub height: u32,
    /// Lattice spacing of the smooth layer, in pixels.
    pub cell: u32,
    /// Share of per-pixel grain mixed over the smooth layer, 0..1.
    pub grain: f32,
    pub seed: u32,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            cell: 16,
            grain: 0.5,
            seed: 0x5eed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseFrame {
    pub width: u32,
    pub height: u32,
    pub values: Vec<u8>,
}

impl NoiseFrame {
    /// Gray RGBA pixels with a constant alpha.
    pub fn to_rgba(&self, alpha: u8) -> Vec<u8> {
        self.values
            .iter()
            .flat_map(|&v| [v, v, v, alpha])
            .collect()
    }
}

#[inline]
fn hash(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

#[inline]
fn unit(x: u32, y: u32, z: u32) -> f32 {
    let h = hash(x ^ hash(y ^ hash(z)));
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[inline]
fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Same spec and frame always yield the same pixels. Opposite edges match
/// when `width` and `height` are multiples of `cell`.
pub fn noise_frame(spec: &NoiseSpec, frame: u64) -> NoiseFrame {
    let (w, h) = (spec.width.max(1), spec.height.max(1));
    let cell = spec.cell.max(1);
    let gx = w.div_ceil(cell);
    let gy = h.div_ceil(cell);
    let z = spec.seed ^ hash(frame as u32 ^ (frame >> 32) as u32);
    let grain = spec.grain.clamp(0.0, 1.0);

    let lattice = |x: u32, y: u32| unit(x % gx, y % gy, z);
    let mut values = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        let cy = y / cell;
        let fy = smooth((y % cell) as f32 / cell as f32);
        for x in 0..w {
            let cx = x / cell;
            let fx = smooth((x % cell) as f32 / cell as f32);
            let top = lattice(cx, cy) * (1.0 - fx) + lattice(cx + 1, cy) * fx;
            let bottom = lattice(cx, cy + 1) * (1.0 - fx) + lattice(cx + 1, cy + 1) * fx;
            let smooth_v = top * (1.0 - fy) + bottom * fy;
            let grain_v = unit(x, y, z.wrapping_add(0x9e37_79b9));
            let v = smooth_v * (1.0 - grain) + grain_v * grain;
            values.push((v * 255.0).round().clamp(0.0, 255.0) as u8);
        }
    }
    NoiseFrame {
        width: w,
        height: h,
        values,
    }
}
