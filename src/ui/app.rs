//! winit application wiring
//!
//! The [`App`] owns the compositor, input forwarder, and browser registry by
//! exclusive ownership and binds them to the window's event callbacks. The
//! demo engine is pumped once per event-loop turn; its callbacks drive
//! texture synchronization, and an emptied registry ends the loop.

use std::sync::Arc;

use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::compositor::{GpuContext, Renderer, SurfaceState, ViewTexture};
use crate::engine::{BrowserRegistry, DemoSource, EngineEvent};
use crate::input::InputForwarder;
use crate::utils::{OsrError, Result};

use super::ViewConfig;

/// Run the embedding demo until the last browser closes.
pub fn run(config: ViewConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(OsrError::from)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct AppState {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    texture: ViewTexture,
    surface: SurfaceState,
    forwarder: InputForwarder,
    registry: BrowserRegistry,
    source: DemoSource,
    /// Cursor position where the middle-button spin drag started.
    drag_from: Option<(f64, f64)>,
}

/// The application: owns every component for its window.
pub struct App {
    config: ViewConfig,
    state: Option<AppState>,
    failure: Option<OsrError>,
}

impl App {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            state: None,
            failure: None,
        }
    }

    fn resume(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Osrview")
            .with_inner_size(LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let gpu = GpuContext::new(window.clone())?;
        let renderer = Renderer::new(&gpu, self.config.background_color);
        let surface = SurfaceState::new(
            self.config.is_transparent(),
            self.config.show_update_rect,
        );

        let size = window.inner_size();
        let source = DemoSource::new(size.width.max(1), size.height.max(1));
        let mut registry = BrowserRegistry::new();
        registry.on_after_created(Box::new(source.browser()));

        self.state = Some(AppState {
            window: window.clone(),
            gpu,
            renderer,
            texture: ViewTexture::new(),
            surface,
            forwarder: InputForwarder::new(),
            registry,
            source,
            drag_from: None,
        });

        window.request_redraw();
        Ok(())
    }

    fn handle_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, closing all browsers");
                if state.registry.is_empty() {
                    event_loop.exit();
                } else {
                    state.registry.close_all();
                }
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size.width, size.height);
                state
                    .forwarder
                    .on_resize(&mut state.registry, size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                state
                    .renderer
                    .render(&mut state.gpu, &state.texture, &state.surface)?;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                state
                    .forwarder
                    .on_key(&mut state.registry, event.physical_key, event.state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((fx, fy)) = state.drag_from {
                    state
                        .renderer
                        .add_spin((position.x - fx) as f32, (position.y - fy) as f32);
                    state.drag_from = Some((position.x, position.y));
                }
                state
                    .forwarder
                    .on_pointer_move(&mut state.registry, position.x, position.y);
            }
            WindowEvent::MouseInput { state: element_state, button, .. } => {
                if button == MouseButton::Middle {
                    state.drag_from = match element_state {
                        ElementState::Pressed => {
                            let cursor = state.forwarder.cursor();
                            Some((f64::from(cursor.x), f64::from(cursor.y)))
                        }
                        ElementState::Released => None,
                    };
                }
                state
                    .forwarder
                    .on_button(&mut state.registry, button, element_state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                state.forwarder.on_scroll(&mut state.registry, delta);
            }
            _ => {}
        }
        Ok(())
    }

    /// Drain engine callbacks and apply them. Returns true when the host
    /// must shut down.
    fn pump_engine(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let mut shutdown = false;
        for event in state.source.pump() {
            match event {
                EngineEvent::Paint(paint) => {
                    let plan = state.surface.plan_upload(
                        paint.kind,
                        &paint.dirty,
                        paint.width,
                        paint.height,
                    );
                    state
                        .texture
                        .apply(&state.gpu.device, &state.gpu.queue, &plan, &paint.buffer);
                }
                EngineEvent::PopupRect(rect) => {
                    state.surface.set_popup_rect(rect);
                }
                EngineEvent::TitleChanged(title) => {
                    state.window.set_title(&title);
                }
                EngineEvent::Closed(id) => {
                    state.registry.do_close(id);
                    if state.registry.on_before_close(id) {
                        shutdown = true;
                    }
                }
                EngineEvent::LoadError {
                    code,
                    description,
                    url,
                } => {
                    error!("load failed: {description} ({code}) for {url}");
                    self.failure = Some(OsrError::EngineLoad {
                        code,
                        description,
                        url,
                    });
                    state.registry.close_all();
                }
            }
        }
        if !shutdown {
            state.window.request_redraw();
        }
        shutdown
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.resume(event_loop) {
            error!("failed to initialize: {err}");
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(err) = self.handle_window_event(event_loop, event) {
            warn!("window event failed: {err}");
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.pump_engine() {
            event_loop.exit();
        }
    }
}
