// ABOUTME: A single glass-effect instance: mask, background copy, uniforms.
// ABOUTME: Owns its GPU resources; dispose() poisons the instance so stale use fails fast.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glass_core::{GlassSettings, PixelBuffer};

use crate::glass_pipeline::{GlassPipeline, GlassUniforms};
use crate::mask::{self, MaskSpec};

/// Shared slot a bus handler fills with the latest delivered buffer.
/// The compositor drains it on the next `prepare`, copying the pixels
/// into its own texture; the producer is free to drop the buffer after
/// publication.
pub type PixelInbox = Rc<RefCell<Option<Arc<PixelBuffer>>>>;

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("Glass compositor used after dispose()")]
    Disposed,
}

/// Disposal state machine, split out so the guard is testable without a
/// GPU device.
#[derive(Debug, Default)]
struct Lifecycle {
    disposed: bool,
}

impl Lifecycle {
    fn ensure_live(&self) -> Result<(), CompositorError> {
        if self.disposed {
            Err(CompositorError::Disposed)
        } else {
            Ok(())
        }
    }

    fn dispose(&mut self) -> Result<(), CompositorError> {
        self.ensure_live()?;
        self.disposed = true;
        Ok(())
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

pub struct GlassCompositor {
    settings: GlassSettings,
    position: (f32, f32),
    // Frame-clamped position, shared by the viewport and the sampling
    // uniforms so the glass always samples where it is drawn
    draw_position: (f32, f32),
    canvas_size: (u32, u32),
    mask: GpuTexture,
    background: Option<GpuTexture>,
    uniform_buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
    bind_group_dirty: bool,
    background_inbox: PixelInbox,
    mask_inbox: PixelInbox,
    lifecycle: Lifecycle,
}

impl GlassCompositor {
    /// Create an instance with a generated rounded-rectangle mask. The
    /// instance does not draw until a background buffer is delivered.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: GlassSettings,
    ) -> Self {
        let settings = settings.sanitized();
        let canvas_size = (settings.glass_width, settings.glass_height);
        let mask = upload_mask_texture(
            device,
            queue,
            &mask_coverage_for(&settings, canvas_size),
            canvas_size,
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glass Uniform Buffer"),
            size: std::mem::size_of::<GlassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            settings,
            position: (100.0, 100.0),
            draw_position: (100.0, 100.0),
            canvas_size,
            mask,
            background: None,
            uniform_buffer,
            bind_group: None,
            bind_group_dirty: true,
            background_inbox: Rc::new(RefCell::new(None)),
            mask_inbox: Rc::new(RefCell::new(None)),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Slot for bus-delivered background buffers.
    pub fn background_inbox(&self) -> PixelInbox {
        Rc::clone(&self.background_inbox)
    }

    /// Slot for bus-delivered content-feed buffers (see `update_image`).
    pub fn mask_inbox(&self) -> PixelInbox {
        Rc::clone(&self.mask_inbox)
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas_size
    }

    pub fn settings(&self) -> &GlassSettings {
        &self.settings
    }

    /// True once a background has been delivered and drawing can happen.
    pub fn is_ready(&self) -> bool {
        self.background.is_some() && !self.lifecycle.disposed
    }

    /// Move the glass. Plain state write; the very next rendered frame
    /// uses exactly this value.
    pub fn set_position(&mut self, x: f32, y: f32) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        self.position = (x, y);
        Ok(())
    }

    /// Change the shape inset. Regenerates the coverage mask.
    pub fn set_margin(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        value: f32,
    ) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        self.settings.margin = value.max(0.0);
        self.regenerate_mask(device, queue);
        Ok(())
    }

    /// Change the depth-field blur radius (clamped to the frame-cost bound).
    pub fn set_blur_amount(&mut self, value: f32) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        self.settings.blur_radius = value.clamp(0.0, glass_core::settings::MAX_BLUR_RADIUS);
        Ok(())
    }

    /// Change shape dimensions and corner roundness. The mask is only
    /// regenerated here or on margin changes, never per frame.
    pub fn set_shape(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        roundness: f32,
    ) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        self.settings.glass_width = width.max(1);
        self.settings.glass_height = height.max(1);
        self.settings.roundness = roundness.max(0.0);
        self.canvas_size = (self.settings.glass_width, self.settings.glass_height);
        self.regenerate_mask(device, queue);
        Ok(())
    }

    /// Replace the background texture with a fresh copy of `pixels`.
    /// The previous texture is destroyed, never partially updated.
    pub fn update_background(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &PixelBuffer,
    ) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        if let Some(old) = self.background.take() {
            old.texture.destroy();
        }
        self.background = Some(upload_rgba_texture(device, queue, pixels));
        self.bind_group_dirty = true;
        Ok(())
    }

    /// Replace the managed content feed: the buffer's red channel
    /// becomes the coverage mask and the glass canvas adopts its size.
    pub fn update_image(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &PixelBuffer,
    ) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        let size = (pixels.width(), pixels.height());
        let coverage: Vec<u8> = pixels.data().iter().step_by(4).copied().collect();
        self.mask.texture.destroy();
        self.mask = upload_mask_texture(device, queue, &coverage, size);
        self.canvas_size = size;
        self.bind_group_dirty = true;
        Ok(())
    }

    /// Drain bus deliveries and refresh GPU-side state. Called once per
    /// frame before the render pass is recorded. `frame_size` bounds
    /// the position the frame will actually draw at.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &GlassPipeline,
        frame_size: (u32, u32),
    ) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;

        let pending_mask = self.mask_inbox.borrow_mut().take();
        if let Some(pixels) = pending_mask {
            self.update_image(device, queue, &pixels)?;
        }
        let pending_background = self.background_inbox.borrow_mut().take();
        if let Some(pixels) = pending_background {
            self.update_background(device, queue, &pixels)?;
        }

        self.draw_position = clamp_position(self.position, self.canvas_size, frame_size);

        let Some(background) = &self.background else {
            return Ok(()); // nothing to draw yet, expected during startup
        };

        let uniforms = GlassUniforms::new(
            self.canvas_size,
            background.size,
            self.draw_position,
            &self.settings,
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        if self.bind_group_dirty || self.bind_group.is_none() {
            self.bind_group = Some(pipeline.create_bind_group(
                device,
                &self.uniform_buffer,
                &self.mask.view,
                &background.view,
            ));
            self.bind_group_dirty = false;
        }
        Ok(())
    }

    /// Record this instance's draw into the pass. A no-op until the
    /// first background delivery. `frame_size` bounds the viewport.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        pipeline: &GlassPipeline,
        frame_size: (u32, u32),
    ) -> Result<(), CompositorError> {
        self.lifecycle.ensure_live()?;
        let Some(bind_group) = &self.bind_group else {
            return Ok(());
        };

        let (w, h) = (self.canvas_size.0 as f32, self.canvas_size.1 as f32);
        let (fw, fh) = (frame_size.0 as f32, frame_size.1 as f32);
        if w > fw || h > fh {
            tracing::debug!("glass canvas larger than frame, skipping draw");
            return Ok(());
        }

        // Same clamped value prepare() wrote into the uniforms
        let (x, y) = self.draw_position;
        render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
        pipeline.render(render_pass, bind_group);
        Ok(())
    }

    /// Release GPU resources eagerly. Every later call on this instance
    /// fails with `CompositorError::Disposed`.
    pub fn dispose(&mut self) -> Result<(), CompositorError> {
        self.lifecycle.dispose()?;
        self.mask.texture.destroy();
        if let Some(background) = self.background.take() {
            background.texture.destroy();
        }
        self.uniform_buffer.destroy();
        self.bind_group = None;
        Ok(())
    }

    fn regenerate_mask(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let coverage = mask_coverage_for(&self.settings, self.canvas_size);
        self.mask.texture.destroy();
        self.mask = upload_mask_texture(device, queue, &coverage, self.canvas_size);
        self.bind_group_dirty = true;
    }
}

/// Keep the glass canvas fully inside the frame. Degenerate frames
/// (smaller than the canvas) pin to the origin.
fn clamp_position(position: (f32, f32), canvas: (u32, u32), frame: (u32, u32)) -> (f32, f32) {
    let max_x = (frame.0 as f32 - canvas.0 as f32).max(0.0);
    let max_y = (frame.1 as f32 - canvas.1 as f32).max(0.0);
    (
        position.0.clamp(0.0, max_x),
        position.1.clamp(0.0, max_y),
    )
}

fn mask_coverage_for(settings: &GlassSettings, canvas_size: (u32, u32)) -> Vec<u8> {
    let spec = MaskSpec::new(
        canvas_size.0,
        canvas_size.1,
        settings.roundness,
        settings.margin,
    );
    mask::coverage(&spec)
}

fn upload_mask_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    coverage: &[u8],
    size: (u32, u32),
) -> GpuTexture {
    let extent = wgpu::Extent3d {
        width: size.0,
        height: size.1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Glass Mask Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        coverage,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(size.0),
            rows_per_image: Some(size.1),
        },
        extent,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        size,
    }
}

fn upload_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &PixelBuffer,
) -> GpuTexture {
    let size = (pixels.width(), pixels.height());
    let extent = wgpu::Extent3d {
        width: size.0,
        height: size.1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Glass Background Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels.data(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.0),
            rows_per_image: Some(size.1),
        },
        extent,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_allows_use_until_disposed() {
        let mut lc = Lifecycle::default();
        assert!(lc.ensure_live().is_ok());
        assert!(lc.dispose().is_ok());
        assert!(matches!(lc.ensure_live(), Err(CompositorError::Disposed)));
    }

    #[test]
    fn double_dispose_fails_fast() {
        let mut lc = Lifecycle::default();
        lc.dispose().unwrap();
        assert!(matches!(lc.dispose(), Err(CompositorError::Disposed)));
    }

    #[test]
    fn out_of_bounds_positions_clamp_into_the_frame() {
        // This value feeds both the viewport and the sampling uniforms,
        // so a wild set_position still draws and samples the same rect.
        let canvas = (400, 240);
        let frame = (1200, 800);
        assert_eq!(clamp_position((5000.0, -40.0), canvas, frame), (800.0, 0.0));
        assert_eq!(clamp_position((100.0, 100.0), canvas, frame), (100.0, 100.0));
    }

    #[test]
    fn frame_smaller_than_canvas_pins_to_origin() {
        assert_eq!(clamp_position((50.0, 50.0), (400, 240), (300, 200)), (0.0, 0.0));
    }
}
