// ABOUTME: Glass visual effect parameters.
// ABOUTME: Controls shape, blur, refraction strength, and rim lighting tunables.

use serde::{Deserialize, Serialize};

/// Largest blur radius the shader will accept. Per-pixel cost grows
/// quadratically with the kernel, so this bounds frame time.
pub const MAX_BLUR_RADIUS: f32 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlassSettings {
    /// Glass canvas width in pixels
    pub glass_width: u32,

    /// Glass canvas height in pixels
    pub glass_height: u32,

    /// Corner roundness of the glass shape in pixels (0 = sharp rectangle)
    pub roundness: f32,

    /// Inset between the canvas edge and the nominal shape, in pixels
    pub margin: f32,

    /// Mask blur radius driving the depth field. Doubling it roughly
    /// doubles visual softness and quadruples per-pixel sample cost.
    pub blur_radius: f32,

    /// Steepening factor mapping blurred depth to the rim band
    pub edge_steepness: f32,

    /// Kernel size and sigma multiplier for the mask blur
    pub sigma_scale: f32,

    /// Lightness added to glass-covered pixels (HSL space)
    pub lightness_lift: f32,

    /// Blur radius used when sampling the background at the rim
    pub rim_blur: f32,

    /// How far the rim bends background sampling coordinates
    pub distortion_strength: f32,

    /// Gain of the specular ring highlight
    pub ring_gain: f32,
}

impl Default for GlassSettings {
    fn default() -> Self {
        Self::subtle()
    }
}

impl GlassSettings {
    /// Default look: soft rim, gentle brightening.
    /// The rim constants are hand-tuned visual parameters, not derived
    /// from a physical model.
    pub fn subtle() -> Self {
        Self {
            glass_width: 400,
            glass_height: 240,
            roundness: 20.0,
            margin: 1.0,
            blur_radius: 1.0,
            edge_steepness: 15.0,
            sigma_scale: 11.0,
            lightness_lift: 0.025,
            rim_blur: 0.5,
            distortion_strength: 2.0,
            ring_gain: 500.0,
        }
    }

    /// Heavier preset: wider blur and stronger refraction at the rim.
    pub fn bold() -> Self {
        Self {
            blur_radius: 1.8,
            distortion_strength: 3.5,
            lightness_lift: 0.05,
            ..Self::subtle()
        }
    }

    /// Clamp fields to the ranges the shader can afford.
    pub fn sanitized(mut self) -> Self {
        self.blur_radius = self.blur_radius.clamp(0.0, MAX_BLUR_RADIUS);
        self.margin = self.margin.max(0.0);
        self.roundness = self.roundness.max(0.0);
        self.glass_width = self.glass_width.max(1);
        self.glass_height = self.glass_height.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_subtle() {
        assert_eq!(GlassSettings::default(), GlassSettings::subtle());
    }

    #[test]
    fn sanitize_bounds_blur_radius() {
        let s = GlassSettings {
            blur_radius: 50.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.blur_radius, MAX_BLUR_RADIUS);
    }

    #[test]
    fn sanitize_rejects_negative_margin_and_roundness() {
        let s = GlassSettings {
            margin: -3.0,
            roundness: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.margin, 0.0);
        assert_eq!(s.roundness, 0.0);
    }

    #[test]
    fn sanitize_keeps_canvas_nonzero() {
        let s = GlassSettings {
            glass_width: 0,
            glass_height: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!((s.glass_width, s.glass_height), (1, 1));
    }
}
