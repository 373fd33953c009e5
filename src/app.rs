use std::{sync::Arc, time::Instant};

use anyhow::Context as _;
use pollster::FutureExt as _;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{
    camera::{Camera, FlySettings},
    config::ViewerConfig,
    input::InputState,
    presets,
    renderer::{wgpu_context::WgpuContext, Renderer},
    scene::Model,
};

struct Gpu {
    window: Arc<Window>,
    wgpu_context: WgpuContext,
    renderer: Renderer,
}

struct App {
    config: ViewerConfig,
    models: Vec<Model>,
    camera: Camera,
    fly: FlySettings,
    input: InputState,
    last_frame: Instant,
    gpu: Option<Gpu>,
    /// Set when startup fails inside the event loop.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig, models: Vec<Model>) -> Self {
        Self {
            camera: config.camera.build(),
            fly: config.camera.fly_settings(),
            config,
            models,
            input: InputState::default(),
            last_frame: Instant::now(),
            gpu: None,
            error: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Gpu> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        if let Err(e) = window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        {
            log::warn!("cursor grab unavailable: {e}");
        }
        window.set_cursor_visible(false);

        let wgpu_context = WgpuContext::new(window.clone()).block_on()?;
        let mut renderer = Renderer::new(&wgpu_context, self.config.clear_color.into());
        for model in &mut self.models {
            renderer
                .upload_model(&wgpu_context, model)
                .context("failed to prepare model materials")?;
        }
        Ok(Gpu {
            window,
            wgpu_context,
            renderer,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let mouse_delta = self.input.take_mouse_delta();
        self.camera
            .fly(self.input.movement(), mouse_delta, dt, &self.fly);
        let camera = self.camera.matrices(gpu.wgpu_context.aspect());

        match gpu
            .renderer
            .render(&gpu.wgpu_context, &mut self.models, &camera)
        {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.wgpu_context.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("frame skipped: {e}"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => {
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.window_event(&event);
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    if gpu.wgpu_context.resize(size.width, size.height) {
                        gpu.renderer.resize(&gpu.wgpu_context);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        self.input.device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

/// Loads every configured model, then runs the window until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let models = config
        .models
        .iter()
        .map(|m| {
            presets::from_config(m).with_context(|| format!("failed to load {}", m.path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    log::info!("loaded {} models", models.len());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config, models);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
