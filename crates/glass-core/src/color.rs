// ABOUTME: Color representation and RGB/HSL conversion utilities.
// ABOUTME: CPU mirror of the shader's lightness math, shared with tests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Shift perceptual lightness by `delta`, clamped to [0, 1].
    /// Matches the shader's `add_lightness` exactly so CPU previews agree
    /// with the rendered result.
    pub fn with_lightness_delta(self, delta: f32) -> Self {
        let (h, s, l) = rgb_to_hsl(self.r, self.g, self.b);
        let (r, g, b) = hsl_to_rgb(h, s, (l + delta).clamp(0.0, 1.0));
        Self { r, g, b, a: self.a }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Convert RGB in [0,1] to (hue, saturation, lightness), all in [0,1].
/// Achromatic input yields saturation exactly 0.
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max_c = r.max(g).max(b);
    let min_c = r.min(g).min(b);
    let delta = max_c - min_c;
    let l = (max_c + min_c) / 2.0;

    if delta == 0.0 {
        // max == min: no hue, no saturation, and no division below
        return (0.0, 0.0, l);
    }

    let s = delta / (1.0 - (2.0 * l - 1.0).abs());
    let mut h = if max_c == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max_c == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    h /= 6.0;
    if h < 0.0 {
        h += 1.0;
    }

    (h, s, l)
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Convert (hue, saturation, lightness) back to RGB, all in [0,1].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        // achromatic passthrough
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn achromatic_round_trip_is_exact() {
        for v in [0.0f32, 0.25, 0.5, 0.73, 1.0] {
            let (h, s, l) = rgb_to_hsl(v, v, v);
            assert_eq!(s, 0.0);
            assert_eq!(h, 0.0);
            let (r, g, b) = hsl_to_rgb(h, s, l);
            assert_eq!((r, g, b), (v, v, v));
        }
    }

    #[test]
    fn chromatic_round_trip_within_tolerance() {
        let samples = [
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (0.8, 0.4, 0.1),
            (0.1, 0.9, 0.7),
        ];
        for (r, g, b) in samples {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (r2, g2, b2) = hsl_to_rgb(h, s, l);
            assert!((r - r2).abs() < 1e-5, "r: {r} vs {r2}");
            assert!((g - g2).abs() < 1e-5, "g: {g} vs {g2}");
            assert!((b - b2).abs() < 1e-5, "b: {b} vs {b2}");
        }
    }

    #[test]
    fn pure_red_hue_is_zero() {
        let (h, s, _) = rgb_to_hsl(1.0, 0.0, 0.0);
        assert_eq!(h, 0.0);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn lightness_delta_brightens() {
        let c = Color::rgb(0.2, 0.4, 0.6).with_lightness_delta(0.1);
        let (_, _, l0) = rgb_to_hsl(0.2, 0.4, 0.6);
        let (_, _, l1) = rgb_to_hsl(c.r, c.g, c.b);
        assert!((l1 - l0 - 0.1).abs() < 1e-5);
    }

    #[test]
    fn lightness_delta_clamps_at_white() {
        let c = Color::WHITE.with_lightness_delta(0.5);
        assert_eq!((c.r, c.g, c.b), (1.0, 1.0, 1.0));
    }
}
