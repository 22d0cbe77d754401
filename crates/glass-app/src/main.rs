// ABOUTME: Main application entry point.
// ABOUTME: Sets up window, event loop, and wires the bus to the renderer.

mod animation;
mod background;
mod placement;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use animation::AmbientAnimation;
use background::BackgroundCapture;
use glass_bus::{topics, BusEvent, PixelBus};
use glass_core::Config;
use glass_renderer::{GlassCompositor, PixelInbox, RenderError, Renderer};
use placement::{Direction, Placement};

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    compositor: Option<GlassCompositor>,
    bus: PixelBus,
    background: BackgroundCapture,
    animation: AmbientAnimation,
    placement: Placement,
    config: Config,
    pointer: (f64, f64),
    // Bus handlers write into these slots; the frame loop drains them
    backdrop_inbox: PixelInbox,
    position_slot: Rc<RefCell<Option<(f32, f32)>>>,
    redraw_requested: Rc<RefCell<bool>>,
}

impl App {
    fn new() -> Self {
        let config = Config::load_or_default();
        let viewport = (config.window_width, config.window_height);
        tracing::info!(
            ambient_mask = config.ambient_mask,
            background = ?config.background_image,
            "Loaded config"
        );

        Self {
            window: None,
            renderer: None,
            compositor: None,
            bus: PixelBus::new(),
            background: BackgroundCapture::new(viewport),
            animation: AmbientAnimation::new(viewport.0, viewport.1),
            placement: Placement::new(config.key_step),
            config,
            pointer: (0.0, 0.0),
            backdrop_inbox: Rc::new(RefCell::new(None)),
            position_slot: Rc::new(RefCell::new(None)),
            redraw_requested: Rc::new(RefCell::new(false)),
        }
    }

    /// Route bus traffic into the frame loop's slots. Handlers only
    /// stash the latest payload; all GPU work happens in `frame`.
    fn wire_bus(&mut self) {
        let Some(compositor) = &self.compositor else {
            return;
        };

        let backdrop = Rc::clone(&self.backdrop_inbox);
        let glass_background = compositor.background_inbox();
        self.bus.subscribe("background-ready.glass", move |event| {
            if let BusEvent::BackgroundReady(pixels) = event {
                *backdrop.borrow_mut() = Some(Arc::clone(pixels));
                *glass_background.borrow_mut() = Some(Arc::clone(pixels));
            }
        });

        if self.config.background_image.is_none() {
            // No static picture: the ambient animation is the background
            let backdrop = Rc::clone(&self.backdrop_inbox);
            let glass_background = compositor.background_inbox();
            self.bus.subscribe("animation-frame.glass", move |event| {
                if let BusEvent::AnimationFrame(pixels) = event {
                    *backdrop.borrow_mut() = Some(Arc::clone(pixels));
                    *glass_background.borrow_mut() = Some(Arc::clone(pixels));
                }
            });
        }

        if self.config.ambient_mask {
            let mask = compositor.mask_inbox();
            self.bus.subscribe("animation-frame.mask", move |event| {
                if let BusEvent::AnimationFrame(pixels) = event {
                    *mask.borrow_mut() = Some(Arc::clone(pixels));
                }
            });
        }

        let position = Rc::clone(&self.position_slot);
        self.bus.subscribe("position-set.glass", move |event| {
            if let BusEvent::PositionSet { x, y } = event {
                *position.borrow_mut() = Some((*x, *y));
            }
        });

        let redraw = Rc::clone(&self.redraw_requested);
        self.bus.subscribe("background-redraw.glass", move |event| {
            if matches!(event, BusEvent::RedrawBackground) {
                *redraw.borrow_mut() = true;
            }
        });
    }

    /// One cooperative scheduling step: collect async results, advance
    /// the animation, drain the bus slots, draw.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        self.background.poll(&mut self.bus);

        if std::mem::take(&mut *self.redraw_requested.borrow_mut()) {
            self.background.publish(&mut self.bus);
        }

        self.animation.frame(&mut self.bus);

        let (Some(renderer), Some(compositor)) = (&mut self.renderer, &mut self.compositor)
        else {
            return;
        };

        let pending_backdrop = self.backdrop_inbox.borrow_mut().take();
        if let Some(pixels) = pending_backdrop {
            renderer.update_backdrop(&pixels);
        }

        let pending_position = self.position_slot.borrow_mut().take();
        if let Some((x, y)) = pending_position {
            if let Err(e) = compositor.set_position(x, y) {
                tracing::error!("Position update failed: {e}");
            }
        }

        match renderer.render(std::slice::from_mut(compositor)) {
            Ok(()) => {}
            Err(RenderError::Surface(
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
            )) => {
                let (w, h) = renderer.size();
                renderer.resize(w, h);
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                tracing::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => tracing::error!("Render error: {e}"),
        }
    }

    /// Apply a placement update to the compositor right away, so a
    /// following update in the same event batch builds on it, then
    /// announce it on the bus.
    fn apply_position(&mut self, x: f32, y: f32) {
        if let Some(compositor) = &mut self.compositor {
            if let Err(e) = compositor.set_position(x, y) {
                tracing::error!("Position update failed: {e}");
            }
        }
        self.bus
            .publish(topics::POSITION_SET, &BusEvent::PositionSet { x, y });
    }

    fn nudge_glass(&mut self, direction: Direction) {
        let (Some(renderer), Some(compositor)) = (&self.renderer, &self.compositor) else {
            return;
        };
        let (x, y) = self.placement.nudge(
            compositor.position(),
            direction,
            compositor.canvas_size(),
            renderer.size(),
        );
        self.apply_position(x, y);
    }

    fn follow_pointer(&mut self) {
        let (Some(renderer), Some(compositor)) = (&self.renderer, &self.compositor) else {
            return;
        };
        let (x, y) = self.placement.center_on_pointer(
            self.pointer,
            compositor.canvas_size(),
            renderer.size(),
        );
        self.apply_position(x, y);
    }

    fn save_screenshot(&self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let pixels = match renderer.capture_frame() {
            Ok(pixels) => pixels,
            Err(e) => {
                tracing::error!("Frame capture failed: {e}");
                return;
            }
        };

        let Some(img) = image::RgbaImage::from_raw(
            pixels.width(),
            pixels.height(),
            pixels.data().to_vec(),
        ) else {
            tracing::error!("Captured frame had unexpected size");
            return;
        };

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = format!("liquid-glass-{stamp}.png");
        match img.save(&path) {
            Ok(()) => tracing::info!("Saved screenshot to {path}"),
            Err(e) => tracing::error!("Failed to save screenshot: {e}"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title("liquid-glass")
            .with_inner_size(LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let renderer = pollster::block_on(Renderer::new(Arc::clone(&window)))
            .expect("Failed to create renderer");

        let physical_size = window.inner_size();
        tracing::info!(
            "Window created: {}x{} physical pixels, scale factor: {}",
            physical_size.width,
            physical_size.height,
            window.scale_factor()
        );

        let compositor = renderer.create_compositor(self.config.glass.clone());
        self.background
            .set_viewport(physical_size.width, physical_size.height);
        self.animation
            .resize(physical_size.width, physical_size.height);

        self.renderer = Some(renderer);
        self.compositor = Some(compositor);
        self.wire_bus();

        if let Some(path) = self.config.background_image.clone() {
            self.background.set_source(&path);
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size.width, new_size.height);
                }
                self.animation.resize(new_size.width, new_size.height);
                self.background
                    .set_viewport(new_size.width, new_size.height);
                self.bus
                    .publish(topics::BACKGROUND_REDRAW, &BusEvent::RedrawBackground);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = (position.x, position.y);
                self.follow_pointer();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match &event.logical_key {
                    Key::Named(NamedKey::ArrowUp) => self.nudge_glass(Direction::Up),
                    Key::Named(NamedKey::ArrowDown) => self.nudge_glass(Direction::Down),
                    Key::Named(NamedKey::ArrowLeft) => self.nudge_glass(Direction::Left),
                    Key::Named(NamedKey::ArrowRight) => self.nudge_glass(Direction::Right),
                    Key::Named(NamedKey::Space) if !event.repeat => {
                        self.animation.toggle_pause();
                    }
                    Key::Named(NamedKey::Escape) => {
                        event_loop.exit();
                    }
                    Key::Character(s) if s == "s" && !event.repeat => {
                        self.save_screenshot();
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting liquid-glass");

    let event_loop = EventLoop::new()?;
    let mut app = App::new();

    event_loop.run_app(&mut app)?;

    Ok(())
}
