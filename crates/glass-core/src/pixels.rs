// ABOUTME: CPU-side RGBA8 pixel buffers shared over the broadcast bus.
// ABOUTME: Published buffers are immutable snapshots; producers build a new one per frame.

use crate::Color;

/// A row-major RGBA8 image. Once published on the bus a buffer is treated
/// as immutable; producers replace it rather than mutate it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Wrap existing RGBA8 bytes. Length must be width * height * 4.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Draw a filled circle. Pixels outside the buffer are clipped.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let rgba = color.to_rgba8();
        let r2 = radius * radius;
        let x0 = ((cx - radius).floor().max(0.0)) as u32;
        let y0 = ((cy - radius).floor().max(0.0)) as u32;
        let x1 = ((cx + radius).ceil() as i64).clamp(0, self.width as i64) as u32;
        let y1 = ((cy + radius).ceil() as i64).clamp(0, self.height as i64) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    let i = ((y * self.width + x) * 4) as usize;
                    self.data[i..i + 4].copy_from_slice(&rgba);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_transparent_black() {
        let buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.data().len(), 48);
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn fill_sets_every_pixel() {
        let mut buf = PixelBuffer::new(3, 3);
        buf.fill(Color::WHITE);
        assert_eq!(buf.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn circle_covers_center_not_corners() {
        let mut buf = PixelBuffer::new(20, 20);
        buf.fill(Color::BLACK);
        buf.fill_circle(10.0, 10.0, 5.0, Color::WHITE);
        assert_eq!(buf.pixel(10, 10), Some([255, 255, 255, 255]));
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(buf.pixel(19, 19), Some([0, 0, 0, 255]));
    }

    #[test]
    fn circle_clips_at_edges() {
        let mut buf = PixelBuffer::new(8, 8);
        buf.fill_circle(0.0, 0.0, 4.0, Color::WHITE);
        assert_eq!(buf.pixel(0, 0), Some([255, 255, 255, 255]));
    }
}
