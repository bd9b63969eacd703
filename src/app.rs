use std::sync::Arc;

use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::{GpuContext, GpuError};
use crate::input::{Input, hotkey_edit};
use crate::mesh_pass::MeshPass;
use crate::rasterizer::RenderError;
use crate::renderer::SceneRenderer;
use crate::scene::SceneState;

/// Anything that ends the viewer early.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop failed")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create the window")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Configuration for the viewer window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Scene the viewer starts from.
    pub scene: SceneState,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Lightbox".to_string(),
            width: 800,
            height: 600,
            scene: SceneState::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn scene(mut self, scene: SceneState) -> Self {
        self.scene = scene;
        self
    }
}

/// Opens the viewer window and runs until it is closed.
///
/// # Example
/// ```no_run
/// use lightbox::{AppConfig, Primitive, SceneState};
///
/// let scene = SceneState::new().with_primitive(Primitive::Torus);
/// lightbox::run(AppConfig::new().title("Torus").scene(scene)).unwrap();
/// ```
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = LightboxApp::Pending(config);
    event_loop.run_app(&mut app)?;

    match app {
        LightboxApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

enum LightboxApp {
    Pending(AppConfig),
    Running(Box<Running>),
    Failed(AppError),
}

struct Running {
    window: Arc<Window>,
    mesh_pass: MeshPass,
    renderer: SceneRenderer,
    scene: SceneState,
    input: Input,
    base_title: String,
    title: String,
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &mut AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let mut mesh_pass = MeshPass::new(gpu);
        let renderer = SceneRenderer::new(&mut mesh_pass)?;

        let mut scene = std::mem::take(&mut config.scene);
        let size = window.inner_size();
        scene.camera.resize(size.width, size.height);
        info!("viewer started at {}x{}", size.width, size.height);

        Ok(Self {
            window,
            mesh_pass,
            renderer,
            scene,
            input: Input::new(),
            base_title: config.title.clone(),
            title: String::new(),
        })
    }

    /// Returns `Ok(false)` once the viewer should close.
    fn handle(&mut self, event: WindowEvent) -> Result<bool, AppError> {
        if let Some(input_event) = self.input.translate(&event) {
            self.scene.handle(input_event);
        }

        match event {
            WindowEvent::CloseRequested => return Ok(false),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    return Ok(false);
                }
                if let Some(edit) = hotkey_edit(code, &self.scene) {
                    if let Err(err) = self.scene.apply(edit) {
                        warn!("{err}");
                    }
                }
            }
            WindowEvent::Resized(size) => {
                self.mesh_pass.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                self.update_title();
                self.renderer.render_frame(&self.scene, &mut self.mesh_pass)?;
                self.window.request_redraw();
            }
            _ => {}
        }
        Ok(true)
    }

    fn update_title(&mut self) {
        let title = format!("{} | {}", self.base_title, self.scene.summary());
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for LightboxApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let LightboxApp::Pending(config) = self else {
            return;
        };
        match Running::start(event_loop, config) {
            Ok(running) => *self = LightboxApp::Running(Box::new(running)),
            Err(err) => {
                error!("{err}");
                *self = LightboxApp::Failed(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let LightboxApp::Running(running) = self else {
            return;
        };
        match running.handle(event) {
            Ok(true) => {}
            Ok(false) => event_loop.exit(),
            Err(err) => {
                error!("{err}");
                *self = LightboxApp::Failed(err);
                event_loop.exit();
            }
        }
    }
}
