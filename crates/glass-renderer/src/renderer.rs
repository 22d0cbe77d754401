// ABOUTME: Frame orchestration: backdrop blit, glass passes, presentation.
// ABOUTME: Also supports synchronous frame readback for screenshots.

use std::sync::Arc;

use glass_core::{GlassSettings, PixelBuffer};
use winit::window::Window;

use crate::blit_pipeline::BlitPipeline;
use crate::compositor::{CompositorError, GlassCompositor};
use crate::glass_pipeline::GlassPipeline;
use crate::gpu::{GpuInitError, GpuState};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Init(#[from] GpuInitError),

    #[error("Failed to acquire surface frame: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error(transparent)]
    Compositor(#[from] CompositorError),

    #[error("Frame capture failed: {0}")]
    Capture(#[from] wgpu::BufferAsyncError),

    #[error("Frame capture did not complete")]
    CaptureLost,
}

struct SceneTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct Renderer {
    gpu: GpuState,
    blit_pipeline: BlitPipeline,
    glass_pipeline: GlassPipeline,
    scene: SceneTarget,
    present_bind_group: wgpu::BindGroup,
    backdrop: Option<BackdropTexture>,
}

struct BackdropTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let gpu = GpuState::new(window).await?;
        let format = gpu.config.format;

        let blit_pipeline = BlitPipeline::new(&gpu.device, format);
        let glass_pipeline = GlassPipeline::new(&gpu.device, format);

        let scene = create_scene_target(&gpu.device, format, gpu.size);
        let present_bind_group = blit_pipeline.create_bind_group(&gpu.device, &scene.view);

        Ok(Self {
            gpu,
            blit_pipeline,
            glass_pipeline,
            scene,
            present_bind_group,
            backdrop: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.gpu.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.gpu.queue
    }

    pub fn size(&self) -> (u32, u32) {
        self.gpu.size
    }

    pub fn glass_pipeline(&self) -> &GlassPipeline {
        &self.glass_pipeline
    }

    pub fn create_compositor(&self, settings: GlassSettings) -> GlassCompositor {
        GlassCompositor::new(&self.gpu.device, &self.gpu.queue, settings)
    }

    /// Replace the scene backdrop. The buffer is expected at frame size
    /// (the caller handles aspect-fill cropping); the blit stretches
    /// whatever arrives.
    pub fn update_backdrop(&mut self, pixels: &PixelBuffer) {
        if let Some(old) = self.backdrop.take() {
            old.texture.destroy();
        }
        let extent = wgpu::Extent3d {
            width: pixels.width(),
            height: pixels.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Backdrop Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels.data(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * pixels.width()),
                rows_per_image: Some(pixels.height()),
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.blit_pipeline.create_bind_group(&self.gpu.device, &view);
        self.backdrop = Some(BackdropTexture {
            texture,
            bind_group,
        });
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.scene.texture.destroy();
        self.scene = create_scene_target(&self.gpu.device, self.gpu.config.format, self.gpu.size);
        self.present_bind_group = self
            .blit_pipeline
            .create_bind_group(&self.gpu.device, &self.scene.view);
    }

    /// Draw one frame: backdrop into the scene texture, each live glass
    /// instance on top, then the scene onto the swapchain.
    pub fn render(&mut self, compositors: &mut [GlassCompositor]) -> Result<(), RenderError> {
        for compositor in compositors.iter_mut() {
            compositor.prepare(
                &self.gpu.device,
                &self.gpu.queue,
                &self.glass_pipeline,
                self.gpu.size,
            )?;
        }

        let frame = self.gpu.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut scene_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(backdrop) = &self.backdrop {
                self.blit_pipeline.render(&mut scene_pass, &backdrop.bind_group);
            }
            for compositor in compositors.iter() {
                compositor.render(&mut scene_pass, &self.glass_pipeline, self.gpu.size)?;
            }
        }

        {
            let mut present_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.blit_pipeline
                .render(&mut present_pass, &self.present_bind_group);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Read the last rendered scene back into a CPU buffer. This blocks
    /// until the GPU finishes; it is the one deliberately synchronous
    /// point in the pipeline, for screenshots only.
    pub fn capture_frame(&self) -> Result<PixelBuffer, RenderError> {
        let (width, height) = self.gpu.size;
        let bytes_per_row = 4 * width;
        let padded_bytes_per_row =
            bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let readback = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback Buffer"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.scene.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| RenderError::CaptureLost)??;

        let mapped = slice.get_mapped_range();
        let swizzle = is_bgra(self.gpu.config.format);
        let mut data = Vec::with_capacity((bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            let row_bytes = &mapped[start..start + bytes_per_row as usize];
            if swizzle {
                for px in row_bytes.chunks_exact(4) {
                    data.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            } else {
                data.extend_from_slice(row_bytes);
            }
        }
        drop(mapped);
        readback.unmap();

        PixelBuffer::from_rgba8(width, height, data).ok_or(RenderError::CaptureLost)
    }
}

fn create_scene_target(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: (u32, u32),
) -> SceneTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Texture"),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    SceneTarget { texture, view }
}

fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_formats_are_swizzled() {
        assert!(is_bgra(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert!(is_bgra(wgpu::TextureFormat::Bgra8Unorm));
        assert!(!is_bgra(wgpu::TextureFormat::Rgba8UnormSrgb));
    }

    #[test]
    fn row_padding_rounds_up_to_copy_alignment() {
        let width = 300u32;
        let padded = (4 * width).div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        assert_eq!(padded, 1280);
        assert!(padded >= 4 * width);
        assert_eq!(padded % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
    }
}
