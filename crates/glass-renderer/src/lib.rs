// ABOUTME: GPU rendering for the liquid glass overlay.
// ABOUTME: Owns device state, the refraction pipeline, and per-instance compositors.

mod blit_pipeline;
mod compositor;
mod glass_pipeline;
mod gpu;
pub mod mask;
mod renderer;

pub use compositor::{CompositorError, GlassCompositor, PixelInbox};
pub use glass_pipeline::GlassPipeline;
pub use gpu::GpuInitError;
pub use renderer::{RenderError, Renderer};
