//! Per-container viewer configuration.
//!
//! Containers declare their options as loosely typed `data-*` attributes. The
//! host collects them into an [`Attributes`] map once, and [`ViewerConfig`]
//! turns that map into a typed structure. Every malformed value falls back to
//! its documented default; parsing never fails.

use crate::constants::*;
use fnv::FnvHashMap;

/// Raw attribute map for one container, keyed without the `data-` prefix.
#[derive(Clone, Debug, Default)]
pub struct Attributes(FnvHashMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boolean flag with the given default for absent or unrecognised values.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        parse_bool(self.get(key), default)
    }

    /// Float that must satisfy `valid`, otherwise `default`.
    pub fn float(&self, key: &str, default: f32, valid: impl Fn(f32) -> bool) -> f32 {
        match self.get(key).and_then(|s| s.trim().parse::<f32>().ok()) {
            Some(v) if v.is_finite() && valid(v) => v,
            _ => default,
        }
    }

    pub fn count(&self, key: &str, default: usize) -> usize {
        self.get(key)
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(default)
    }

    /// Like [`Attributes::count`], but values above `max` are rejected.
    pub fn count_at_most(&self, key: &str, default: usize, max: usize) -> usize {
        match self.count(key, default) {
            n if n <= max => n,
            _ => default,
        }
    }

    pub fn color(&self, key: &str) -> Option<Rgb> {
        self.get(key).and_then(Rgb::parse)
    }

    /// Non-empty, trimmed string value.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|s| !s.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

/// Presence of an empty attribute (`data-autorotate`) counts as `true`.
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) if s.is_empty() || s == "true" || s == "1" || s == "yes" => true,
        Some(s) if s == "false" || s == "0" || s == "no" => false,
        _ => default,
    }
}

/// sRGB color with components in 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Accepts `#rgb`, `#rrggbb`, `0xrrggbb`, bare `rrggbb`, `white` and `black`.
    pub fn parse(input: &str) -> Option<Rgb> {
        let s = input.trim().to_ascii_lowercase();
        match s.as_str() {
            "white" => return Some(Rgb::WHITE),
            "black" => return Some(Rgb::BLACK),
            _ => {}
        }
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(&s);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |v: u32| v as f32 / 255.0;
        match hex.len() {
            3 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                let expand = |n: u32| channel(n * 17);
                Some(Rgb::new(
                    expand((v >> 8) & 0xf),
                    expand((v >> 4) & 0xf),
                    expand(v & 0xf),
                ))
            }
            6 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Rgb::new(
                    channel((v >> 16) & 0xff),
                    channel((v >> 8) & 0xff),
                    channel(v & 0xff),
                ))
            }
            _ => None,
        }
    }

    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }
}

#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
pub fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Clear color in linear space with straight alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearColor {
    pub rgb: [f32; 3],
    pub alpha: f32,
}

impl ClearColor {
    pub const TRANSPARENT: ClearColor = ClearColor {
        rgb: [0.0, 0.0, 0.0],
        alpha: 0.0,
    };
    pub const OPAQUE_BLACK: ClearColor = ClearColor {
        rgb: [0.0, 0.0, 0.0],
        alpha: 1.0,
    };

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroundConfig {
    pub color: Rgb,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StarConfig {
    pub count: usize,
    pub color: Rgb,
    pub size: f32,
    pub radius: f32,
}

/// Typed view of a container's viewer options.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub model: Option<String>,
    pub autorotate: bool,
    pub zoom: f32,
    pub background: Option<Rgb>,
    pub background_alpha: f32,
    pub env_hdr: Option<String>,
    pub env_background: bool,
    pub shadows: bool,
    pub ground: Option<GroundConfig>,
    pub exposure: f32,
    pub stars: Option<StarConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::from_attributes(&Attributes::default())
    }
}

impl ViewerConfig {
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let ground = attrs.flag("ground", false).then(|| GroundConfig {
            color: attrs.color("ground-color").unwrap_or(Rgb::WHITE),
            opacity: attrs
                .float("ground-opacity", GROUND_DEFAULT_OPACITY, |v| v >= 0.0)
                .min(1.0),
        });
        let stars = attrs.flag("stars", false).then(|| StarConfig {
            count: attrs.count_at_most("stars-count", STARS_DEFAULT_COUNT, STARS_MAX_COUNT),
            color: attrs.color("stars-color").unwrap_or(Rgb::WHITE),
            size: attrs.float("stars-size", STARS_DEFAULT_SIZE, |v| v > 0.0),
            radius: attrs.float("stars-radius", STARS_DEFAULT_RADIUS, |v| v > 0.0),
        });
        // Both spellings are in use on existing pages.
        let shadows = attrs.flag("shadows", false) || attrs.flag("shadow", false);

        Self {
            model: attrs.text("model").map(str::to_owned),
            autorotate: attrs.flag("autorotate", false),
            zoom: attrs.float("zoom", 1.0, |v| v > 0.0),
            background: attrs.color("bg-color"),
            background_alpha: attrs.float("bg-alpha", 1.0, |v| (0.0..=1.0).contains(&v)),
            env_hdr: attrs.text("env-hdr").map(str::to_owned),
            env_background: attrs.flag("env-background", false),
            shadows,
            ground,
            exposure: attrs.float("exposure", DEFAULT_EXPOSURE, |v| v >= 0.0),
            stars,
        }
    }

    /// Explicit color wins, then opaque black behind a star field, else transparent.
    pub fn clear_color(&self) -> ClearColor {
        match (self.background, &self.stars) {
            (Some(c), _) => ClearColor {
                rgb: c.to_linear(),
                alpha: self.background_alpha,
            },
            (None, Some(_)) => ClearColor::OPAQUE_BLACK,
            (None, None) => ClearColor::TRANSPARENT,
        }
    }

    /// A ground catcher only shows shadows, so it turns the shadow map on as well.
    pub fn shadow_map_enabled(&self) -> bool {
        self.shadows || self.ground.is_some()
    }
}
