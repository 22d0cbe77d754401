// ABOUTME: Typed event payloads carried over the bus.
// ABOUTME: A closed set of variants replaces untyped positional argument lists.

use std::sync::Arc;

use glass_core::PixelBuffer;

/// Payload delivered to bus handlers. One variant per event kind, so
/// handlers match on the variant instead of guessing argument shapes.
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// Fresh backdrop pixels are available (capture or resize redraw)
    BackgroundReady(Arc<PixelBuffer>),

    /// The ambient animation produced a new content-feed frame
    AnimationFrame(Arc<PixelBuffer>),

    /// Somebody wants the backdrop re-rendered at the current viewport
    RedrawBackground,

    /// A glass instance was moved (informational, placement is applied
    /// directly to the instance)
    PositionSet { x: f32, y: f32 },
}

/// Event names used by the core pipeline.
pub mod topics {
    pub const BACKGROUND_READY: &str = "background-ready";
    pub const BACKGROUND_REDRAW: &str = "background-redraw";
    pub const ANIMATION_FRAME: &str = "animation-frame";
    pub const POSITION_SET: &str = "position-set";
}
