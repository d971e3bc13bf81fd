//! Platform layer: window ownership and the event loop.
//!
//! Single-threaded by construction: the window, the wgpu surface and every
//! GPU call live on the event-loop thread. The loop idles between frames,
//! draws on `RedrawRequested`, and exits within one iteration of the close
//! flag (window close button or Escape) being set.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use asset::{MeshData, ShaderPair};
use renderer::GpuState;

/// Radians of orbit per pixel of mouse drag.
const ORBIT_SENSITIVITY: f32 = 0.005;

/// Window and GPU configuration for one run.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub backends: wgpu::Backends,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "objview".into(),
            backends: wgpu::Backends::all(),
        }
    }
}

/// Open a window and render the mesh until the user closes it.
/// Returns after the event loop exits, propagating any fatal error.
pub fn run(config: AppConfig, mesh: MeshData, shaders: ShaderPair) -> Result<()> {
    let event_loop: EventLoop<()> = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, mesh, shaders);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: AppConfig,
    // Consumed on first resume when the GPU comes up.
    mesh: Option<MeshData>,
    shaders: ShaderPair,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,

    cursor: Option<PhysicalPosition<f64>>,
    dragging: bool,

    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig, mesh: MeshData, shaders: ShaderPair) -> Self {
        Self {
            config,
            mesh: Some(mesh),
            shaders,
            window: None,
            gpu: None,
            cursor: None,
            dragging: false,
            fatal: None,
        }
    }

    fn abort(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("Fatal: {err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let mut gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            &self.shaders,
        ))
        .context("Failed to initialize GPU state")?;

        if let Some(mesh) = self.mesh.take() {
            gpu.upload_mesh(&mesh).context("Failed to upload mesh")?;
        }

        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        match gpu.render() {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost/outdated, reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.abort(event_loop, anyhow!("Surface out of memory"));
            }
            Err(err) => {
                log::warn!("Frame skipped: {err}");
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_gpu(event_loop) {
            self.abort(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(width, height);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let (Some(last), Some(gpu)) = (self.cursor, self.gpu.as_mut()) {
                        let dx = (position.x - last.x) as f32;
                        let dy = (position.y - last.y) as f32;
                        gpu.orbit_camera(dx * ORBIT_SENSITIVITY, dy * ORBIT_SENSITIVITY);
                    }
                }
                self.cursor = Some(position);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous rendering, paced by AutoVsync at present time.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
