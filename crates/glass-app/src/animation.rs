// ABOUTME: Ambient decoration surface redrawn every frame and broadcast.
// ABOUTME: Pausing freezes the drawing but keeps subscribers fed.

use std::sync::Arc;

use glass_bus::{topics, BusEvent, PixelBus};
use glass_core::{Color, PixelBuffer};

const ORBIT_PERIOD: f32 = 50.0;
const ORBIT_REACH: f32 = 150.0;

/// Two circles on a dark field, one of them swinging side to side. The
/// surface pixels are published every scheduling step so compositors
/// always have a current background.
pub struct AmbientAnimation {
    surface: PixelBuffer,
    tick: u64,
    paused: bool,
}

impl AmbientAnimation {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: PixelBuffer::new(width.max(1), height.max(1)),
            tick: 0,
            paused: false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface = PixelBuffer::new(width.max(1), height.max(1));
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        tracing::info!(paused = self.paused, "Ambient animation pause toggled");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// One scheduling step: advance and redraw unless paused, then
    /// broadcast the surface. While paused the last drawn frame keeps
    /// being published so subscribers hold a valid, static buffer.
    pub fn frame(&mut self, bus: &mut PixelBus) -> usize {
        if !self.paused {
            self.tick += 1;
            self.redraw();
        }
        let snapshot = Arc::new(self.surface.clone());
        bus.publish(topics::ANIMATION_FRAME, &BusEvent::AnimationFrame(snapshot))
    }

    fn redraw(&mut self) {
        let w = self.surface.width() as f32;
        let h = self.surface.height() as f32;
        self.surface.fill(Color::rgb(0.10, 0.12, 0.16));

        self.surface
            .fill_circle(w * 0.25, h * 0.5, 90.0, Color::rgb(0.85, 0.45, 0.30));

        let swing = (self.tick as f32 / ORBIT_PERIOD).sin() * ORBIT_REACH;
        self.surface
            .fill_circle(w * 0.6 + swing, h * 0.45, 120.0, Color::rgb(0.35, 0.55, 0.85));
    }
}
