// ABOUTME: Rounded-rectangle coverage mask generation.
// ABOUTME: Signed-distance rasterization producing a blur-friendly R8 plane.

/// Shape of a glass mask. `margin` insets the rectangle from the canvas
/// edge; `roundness` is the corner radius in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskSpec {
    pub width: u32,
    pub height: u32,
    pub roundness: f32,
    pub margin: f32,
}

impl MaskSpec {
    pub fn new(width: u32, height: u32, roundness: f32, margin: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            roundness: roundness.max(0.0),
            margin: margin.max(0.0),
        }
    }
}

/// Signed distance from a point to a rounded rectangle centered at
/// (cx, cy) with the given half extents. Negative inside.
fn rounded_rect_distance(px: f32, py: f32, cx: f32, cy: f32, half_w: f32, half_h: f32, radius: f32) -> f32 {
    let r = radius.min(half_w).min(half_h);
    let qx = (px - cx).abs() - (half_w - r);
    let qy = (py - cy).abs() - (half_h - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - r
}

/// Rasterize the coverage field, one byte per texel, row-major from the
/// top-left. The edge falls off linearly over one texel so a later blur
/// yields a continuous depth field rather than aliased steps.
pub fn coverage(spec: &MaskSpec) -> Vec<u8> {
    let w = spec.width as usize;
    let h = spec.height as usize;
    let cx = spec.width as f32 / 2.0;
    let cy = spec.height as f32 / 2.0;
    let half_w = (cx - spec.margin).max(0.5);
    let half_h = (cy - spec.margin).max(0.5);

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let d = rounded_rect_distance(
                x as f32 + 0.5,
                y as f32 + 0.5,
                cx,
                cy,
                half_w,
                half_h,
                spec.roundness,
            );
            let c = (0.5 - d).clamp(0.0, 1.0);
            out[y * w + x] = (c * 255.0).round() as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(mask: &[u8], spec: &MaskSpec, x: u32, y: u32) -> u8 {
        mask[(y * spec.width + x) as usize]
    }

    #[test]
    fn interior_is_fully_covered() {
        let spec = MaskSpec::new(64, 48, 8.0, 2.0);
        let mask = coverage(&spec);
        assert_eq!(value(&mask, &spec, 32, 24), 255);
    }

    #[test]
    fn sharp_rectangle_covers_its_corners() {
        let spec = MaskSpec::new(32, 32, 0.0, 0.0);
        let mask = coverage(&spec);
        assert_eq!(value(&mask, &spec, 0, 0), 255);
        assert_eq!(value(&mask, &spec, 31, 31), 255);
    }

    #[test]
    fn rounding_cuts_corner_coverage() {
        let spec = MaskSpec::new(64, 64, 16.0, 0.0);
        let mask = coverage(&spec);
        assert_eq!(value(&mask, &spec, 0, 0), 0);
        assert_eq!(value(&mask, &spec, 32, 0), 255);
    }

    #[test]
    fn regeneration_with_same_shape_is_byte_identical() {
        // The other half of draw idempotence: the mask texture a shape
        // produces never varies between regenerations.
        let spec = MaskSpec::new(64, 48, 8.0, 2.0);
        assert_eq!(coverage(&spec), coverage(&spec));
    }

    #[test]
    fn margin_leaves_an_empty_band() {
        let spec = MaskSpec::new(64, 64, 0.0, 6.0);
        let mask = coverage(&spec);
        assert_eq!(value(&mask, &spec, 0, 32), 0);
        assert_eq!(value(&mask, &spec, 3, 32), 0);
        assert_eq!(value(&mask, &spec, 10, 32), 255);
    }

    // CPU mirror of the shader's depth/border derivation, used to check
    // the edge-localization property without a GPU.
    fn blurred_depth(mask: &[u8], spec: &MaskSpec, x: i32, y: i32, radius: f32, sigma_scale: f32) -> f32 {
        let sigma = radius * sigma_scale;
        let kernel = (radius * sigma_scale) as i32;
        let mut sum = 0.0;
        let mut weight_sum = 0.0;
        for dx in -kernel..=kernel {
            for dy in -kernel..=kernel {
                let dist2 = (dx * dx + dy * dy) as f32;
                let weight = (-dist2 / (2.0 * sigma * sigma)).exp();
                let sx = (x + dx).clamp(0, spec.width as i32 - 1) as u32;
                let sy = (y + dy).clamp(0, spec.height as i32 - 1) as u32;
                sum += mask[(sy * spec.width + sx) as usize] as f32 / 255.0 * weight;
                weight_sum += weight;
            }
        }
        let depth = sum / weight_sum;
        if depth < 0.5 {
            0.0
        } else {
            depth
        }
    }

    fn border_weight(depth: f32, steepness: f32) -> f32 {
        ((depth - 0.5) * steepness).clamp(0.0, 1.0)
    }

    #[test]
    fn ring_band_is_localized_to_the_boundary() {
        let spec = MaskSpec::new(64, 64, 0.0, 8.0);
        let mask = coverage(&spec);
        let radius = 1.0;
        let sigma_scale = 11.0;
        let kernel = (radius * sigma_scale) as i32;

        let ring = |x: i32, y: i32| {
            let b = border_weight(blurred_depth(&mask, &spec, x, y, radius, sigma_scale), 15.0);
            b - b * b
        };

        // Deep interior saturates (border 1) and far exterior is clipped
        // (border 0); in both cases the ring weight vanishes.
        assert_eq!(ring(32, 32), 0.0);
        assert_eq!(ring(1, 1), 0.0);

        // The band lives within one kernel radius of the shape boundary
        // at x = margin = 8.
        let mut peak = 0.0f32;
        for x in (8 - kernel)..=(8 + kernel) {
            peak = peak.max(ring(x, 32));
        }
        assert!(peak > 0.0, "expected a ring band near the boundary");

        // And nowhere else along the row.
        for x in 0i32..64 {
            if (x - 8).abs() > kernel && (x - 56).abs() > kernel {
                assert_eq!(ring(x, 32), 0.0, "unexpected ring weight at x={x}");
            }
        }
    }

    #[test]
    fn deep_interior_border_saturates() {
        let spec = MaskSpec::new(64, 64, 0.0, 8.0);
        let mask = coverage(&spec);
        let depth = blurred_depth(&mask, &spec, 32, 32, 1.0, 11.0);
        assert_eq!(border_weight(depth, 15.0), 1.0);
    }
}
