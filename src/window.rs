//! Desktop host: a winit window standing in for the page around the cloud.
//!
//! The scroll wheel and arrow keys drive progress, window resizes and
//! scale-factor changes drive [`PointCloud::resize`], and every redraw runs
//! one [`PointCloud::tick`]. Dragging with the left button orbits the camera.

use std::sync::Arc;

use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::cloud::PointCloud;
use crate::config::CloudConfig;
use crate::error::CloudError;
use crate::gpu::{FrameTarget, GpuBackend, GpuContext};
use crate::params::clamp_progress;
use crate::time::Clock;
use crate::viewport::Viewport;

/// Progress per wheel line or arrow key press.
const PROGRESS_STEP: f32 = 0.05;

/// Pixel-delta scrolls are converted to lines at this many pixels per line.
const PIXELS_PER_LINE: f64 = 40.0;

/// Event loop policy: redraw continuously unless the window is hidden.
fn control_flow(paused: bool) -> ControlFlow {
    if paused {
        ControlFlow::Wait
    } else {
        ControlFlow::Poll
    }
}

/// Accumulates scroll input into a progress value in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollProgress {
    value: f32,
}

impl ScrollProgress {
    /// Scroll by `lines`; positive scrolls forward. Returns the new progress.
    pub fn scroll(&mut self, lines: f32) -> f32 {
        self.set(self.value + lines * PROGRESS_STEP)
    }

    pub fn set(&mut self, value: f32) -> f32 {
        self.value = clamp_progress(value);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

struct App {
    config: CloudConfig,
    window: Option<Arc<Window>>,
    cloud: Option<PointCloud<GpuBackend>>,
    clock: Clock,
    progress: ScrollProgress,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<CloudError>,
}

impl App {
    fn new(config: CloudConfig) -> Self {
        Self {
            config,
            window: None,
            cloud: None,
            clock: Clock::new(),
            progress: ScrollProgress::default(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), CloudError> {
        let window_attrs = Window::default_attributes()
            .with_title("flowcloud")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let physical = window.inner_size();
        let viewport = Viewport::from_window(physical, window.scale_factor());
        let (context, surface) = pollster::block_on(GpuContext::for_window(
            window.clone(),
            physical.width,
            physical.height,
        ))?;
        let mut backend = GpuBackend::new(context, FrameTarget::Surface(surface), &self.config);
        backend.set_window_size(physical.width, physical.height);

        self.cloud = Some(PointCloud::new(&self.config, backend, viewport)?);
        self.window = Some(window.clone());
        window.request_redraw();
        Ok(())
    }

    fn post_resize(&mut self) {
        if let (Some(window), Some(cloud)) = (&self.window, &mut self.cloud) {
            let physical = window.inner_size();
            let viewport = Viewport::from_window(physical, window.scale_factor());
            cloud.backend_mut().set_window_size(physical.width, physical.height);
            cloud.resize(viewport.width, viewport.height, viewport.pixel_ratio);
        }
    }

    fn post_progress(&mut self, progress: f32) {
        if let Some(cloud) = &mut self.cloud {
            cloud.set_progress(progress);
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let progress = match code {
            KeyCode::ArrowDown | KeyCode::PageDown => self.progress.scroll(1.0),
            KeyCode::ArrowUp | KeyCode::PageUp => self.progress.scroll(-1.0),
            KeyCode::Home => self.progress.set(0.0),
            KeyCode::End => self.progress.set(1.0),
            KeyCode::Escape => {
                event_loop.exit();
                return;
            }
            _ => return,
        };
        self.post_progress(progress);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        event_loop.set_control_flow(control_flow(false));
        if let Err(e) = self.init(event_loop) {
            error!("Failed to start: {}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.post_resize();
            }
            WindowEvent::Occluded(occluded) => {
                if occluded {
                    self.clock.pause();
                } else {
                    self.clock.resume();
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                event_loop.set_control_flow(control_flow(self.clock.is_paused()));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.on_key(event_loop, &event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                // Wheel down scrolls the page forward.
                let progress = self.progress.scroll(-lines);
                self.post_progress(progress);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let (Some((last_x, last_y)), Some(cloud)) = (self.last_mouse_pos, &mut self.cloud) {
                        let camera = cloud.camera_mut();
                        camera.yaw -= (position.x - last_x) as f32 * 0.005;
                        camera.pitch = (camera.pitch + (position.y - last_y) as f32 * 0.005).clamp(-1.5, 1.5);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::RedrawRequested => {
                let (elapsed, delta) = self.clock.tick();
                if let Some(cloud) = &mut self.cloud {
                    cloud.tick(elapsed, delta);
                }
                if self.clock.is_paused() {
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the cloud until it is closed.
///
/// Returns an error if the window or GPU could not be set up; in that case
/// no frame was drawn.
pub fn run(config: CloudConfig) -> Result<(), CloudError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.error.take() {
        return Err(e);
    }
    if let Some(cloud) = &app.cloud {
        info!(
            "Closed after {} frames ({} skipped)",
            cloud.frames(),
            cloud.skipped_frames()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_progress_clamps() {
        let mut progress = ScrollProgress::default();
        assert_eq!(progress.scroll(-3.0), 0.0);
        for _ in 0..100 {
            progress.scroll(1.0);
        }
        assert_eq!(progress.value(), 1.0);
    }

    #[test]
    fn test_hidden_window_waits_for_events() {
        assert_eq!(control_flow(true), ControlFlow::Wait);
        assert_eq!(control_flow(false), ControlFlow::Poll);

        let mut clock = Clock::new();
        clock.pause();
        assert_eq!(control_flow(clock.is_paused()), ControlFlow::Wait);
        clock.resume();
        assert_eq!(control_flow(clock.is_paused()), ControlFlow::Poll);
    }

    #[test]
    fn test_scroll_progress_reverses() {
        let mut progress = ScrollProgress::default();
        progress.scroll(4.0);
        let forward = progress.value();
        assert!((forward - 0.2).abs() < 1e-6);
        progress.scroll(-4.0);
        assert!(progress.value().abs() < 1e-6);
    }
}
