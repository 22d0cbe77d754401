// ABOUTME: Loads the background picture and keeps it fit to the viewport.
// ABOUTME: Decodes off-thread; stale loads are discarded by generation.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

use glass_bus::{topics, BusEvent, PixelBus};
use glass_core::PixelBuffer;
use image::RgbaImage;

/// Aspect-fill placement of a natural-size image inside a viewport:
/// scaled by the larger axis ratio, centered, overflow cropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub fn fit_rect(natural: (u32, u32), viewport: (u32, u32)) -> FitRect {
    let (nw, nh) = (natural.0.max(1) as f64, natural.1.max(1) as f64);
    let (vw, vh) = (viewport.0 as f64, viewport.1 as f64);
    let scale = (vw / nw).max(vh / nh);
    let width = (nw * scale).round().max(1.0) as u32;
    let height = (nh * scale).round().max(1.0) as u32;
    FitRect {
        x: ((viewport.0 as i64) - (width as i64)) / 2,
        y: ((viewport.1 as i64) - (height as i64)) / 2,
        width,
        height,
    }
}

type DecodeResult = Result<RgbaImage, image::ImageError>;

/// The one authoritative background source. Owns the decoded image,
/// recomposes on resize, and publishes raw pixels on every change.
pub struct BackgroundCapture {
    source: Option<RgbaImage>,
    viewport: (u32, u32),
    pending: Option<Receiver<DecodeResult>>,
    generation: u64,
}

impl BackgroundCapture {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            source: None,
            viewport,
            pending: None,
            generation: 0,
        }
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Start decoding `path` on a worker thread. A newer call supersedes
    /// any in-flight decode; the superseded result is dropped on arrival.
    pub fn set_source(&mut self, path: &Path) {
        self.generation += 1;
        let (tx, rx) = channel();
        self.pending = Some(rx);

        let path: PathBuf = path.to_owned();
        let generation = self.generation;
        std::thread::spawn(move || {
            tracing::debug!(?path, generation, "Decoding background image");
            let result = image::open(&path).map(|img| img.into_rgba8());
            // The receiver may already have been replaced; that is fine
            let _ = tx.send(result);
        });
    }

    /// Collect a finished decode, if any. Publishes the recomposed
    /// background on success; on failure the prior background stays.
    pub fn poll(&mut self, bus: &mut PixelBus) {
        let Some(rx) = &self.pending else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(std::sync::mpsc::TryRecvError::Empty) => return,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.pending = None;
                return;
            }
        };
        self.pending = None;

        match result {
            Ok(img) => {
                tracing::info!(width = img.width(), height = img.height(), "Background loaded");
                self.source = Some(img);
                self.publish(bus);
            }
            Err(e) => {
                tracing::warn!("Background image failed to decode: {e}");
            }
        }
    }

    /// Adopt a new viewport size. No-op without a loaded image.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Recompose at the current viewport and broadcast the pixels.
    pub fn publish(&mut self, bus: &mut PixelBus) {
        let Some(pixels) = self.compose() else {
            return;
        };
        bus.publish(
            topics::BACKGROUND_READY,
            &BusEvent::BackgroundReady(Arc::new(pixels)),
        );
    }

    fn compose(&self) -> Option<PixelBuffer> {
        let source = self.source.as_ref()?;
        let (vw, vh) = self.viewport;
        if vw == 0 || vh == 0 {
            return None;
        }

        let rect = fit_rect((source.width(), source.height()), (vw, vh));
        let scaled = image::imageops::resize(
            source,
            rect.width,
            rect.height,
            image::imageops::FilterType::Triangle,
        );

        // Aspect-fill guarantees the scaled image covers the viewport,
        // so the crop offsets are non-negative
        let x0 = (-rect.x).max(0) as u32;
        let y0 = (-rect.y).max(0) as u32;
        let mut out = PixelBuffer::new(vw, vh);
        for y in 0..vh {
            let sy = (y0 + y).min(rect.height.saturating_sub(1));
            for x in 0..vw {
                let sx = (x0 + x).min(rect.width.saturating_sub(1));
                let px = scaled.get_pixel(sx, sy).0;
                out.put_pixel(x, y, px);
            }
        }
        Some(out)
    }
}
