//! Window lifecycle and input handling.
//!
//! The event loop drives one simulation step and one frame per redraw.
//! Keyboard controls: `D` dynamic connections, `P` persistent connections,
//! `R` reset the persistent set, `Space` pause. The mouse orbits and zooms
//! the camera. Occlusion pauses the clock so the cloud does not jump ahead
//! while the window is hidden.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::config::Config;
use crate::connections::{ConnectionGraph, ConnectionMode};
use crate::error::AppError;
use crate::gpu::GpuState;
use crate::particles::ParticleCloud;
use crate::time::FrameClock;

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    cloud: ParticleCloud,
    graph: ConnectionGraph,
    clock: FrameClock,
    /// True while the user has paused with Space, separate from occlusion.
    user_paused: bool,
    /// True while the window is occluded.
    occluded: bool,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn new(config: Config) -> Self {
        let cloud = ParticleCloud::new(&config);
        let graph = ConnectionGraph::new(config.connection_distance);
        Self {
            config,
            window: None,
            gpu_state: None,
            cloud,
            graph,
            clock: FrameClock::new(),
            user_paused: false,
            occluded: false,
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn handle_key(&mut self, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match event.logical_key {
            Key::Character(ref c) if c.eq_ignore_ascii_case("d") => {
                log::info!("connection mode: dynamic");
                self.graph
                    .set_mode(ConnectionMode::Dynamic, self.cloud.positions());
            }
            Key::Character(ref c) if c.eq_ignore_ascii_case("p") => {
                log::info!("connection mode: persistent");
                self.graph
                    .set_mode(ConnectionMode::Persistent, self.cloud.positions());
            }
            Key::Character(ref c) if c.eq_ignore_ascii_case("r") => {
                log::info!("persistent connections reset");
                self.graph.reset();
            }
            Key::Named(NamedKey::Space) => {
                self.toggle_user_pause();
            }
            _ => {}
        }
    }

    fn toggle_user_pause(&mut self) {
        self.user_paused = !self.user_paused;
        self.sync_clock_pause();
    }

    fn set_occluded(&mut self, occluded: bool) {
        self.occluded = occluded;
        self.sync_clock_pause();
    }

    /// The clock runs only while neither pause source is active, so Space
    /// during occlusion (or occlusion during a user pause) cannot resume it.
    fn sync_clock_pause(&mut self) {
        if self.user_paused || self.occluded {
            self.clock.pause();
        } else {
            self.clock.resume();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        let (elapsed, delta) = self.clock.tick();
        if delta > 0.0 {
            self.cloud.update(delta);
            self.graph.update(self.cloud.positions());
        }
        let update = self.graph.commit_geometry();

        let result = gpu_state.render(
            elapsed,
            delta,
            self.cloud.positions(),
            update,
            self.graph.positions(),
            self.graph.colors(),
        );
        match result {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost) => gpu_state.resize(winit::dpi::PhysicalSize {
                width: gpu_state.config.width,
                height: gpu_state.config.height,
            }),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Plexus")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            let window = match event_loop.create_window(window_attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    log::error!("failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };
            self.window = Some(window.clone());

            match pollster::block_on(GpuState::new(window, &self.config)) {
                Ok(gpu_state) => self.gpu_state = Some(gpu_state),
                Err(e) => {
                    log::error!("GPU initialization failed: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.set_occluded(occluded);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event);
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
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.orbit(dx, dy);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

/// Open a window and run the animation until it is closed.
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(Config {
            particle_count: 8,
            ..Config::default()
        })
    }

    #[test]
    fn test_space_during_occlusion_keeps_clock_paused() {
        let mut app = test_app();
        app.set_occluded(true);
        assert!(app.clock.is_paused());

        // Space while hidden must not restart the clock.
        app.toggle_user_pause();
        assert!(app.clock.is_paused());
        app.toggle_user_pause();
        assert!(app.clock.is_paused());

        app.set_occluded(false);
        assert!(!app.clock.is_paused());
    }

    #[test]
    fn test_user_pause_survives_reveal() {
        let mut app = test_app();
        app.toggle_user_pause();
        app.set_occluded(true);
        app.set_occluded(false);
        assert!(app.clock.is_paused());

        app.toggle_user_pause();
        assert!(!app.clock.is_paused());
    }
}
