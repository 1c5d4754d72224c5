use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use super::input::InputCollector;
use super::metrics::RateWindow;
use super::pacing::{FixedStep, RenderPacer};
use super::scene::SceneRuntime;
use super::{OverlayData, Renderer, Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    /// Longest frame the simulation will catch up on.
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// `None` or `Some(0)` renders as fast as the event loop spins.
    pub max_render_fps: Option<u32>,
    pub overlay_visible_on_start: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Shrine Quest".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(120),
            overlay_visible_on_start: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window, loads `scene` and drives it until the window closes.
pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    let mut app = GameLoop::new(config, window, renderer, SceneRuntime::new(scene));
    app.start();
    event_loop
        .run(move |event, target| app.handle_event(event, target))
        .map_err(AppError::EventLoopRun)
}

/// Everything the event-loop closure owns between callbacks.
struct GameLoop {
    config: LoopConfig,
    window: Arc<Window>,
    renderer: Renderer,
    runtime: SceneRuntime,
    input: InputCollector,
    clock: FixedStep,
    pacer: RenderPacer,
    rates: RateWindow,
    last_frame: Instant,
    overlay_visible: bool,
    shown_title: Option<String>,
}

impl GameLoop {
    fn new(
        config: LoopConfig,
        window: Arc<Window>,
        renderer: Renderer,
        runtime: SceneRuntime,
    ) -> Self {
        let size = window.inner_size();
        let now = Instant::now();
        Self {
            input: InputCollector::new(size.width, size.height),
            clock: FixedStep::new(
                config.target_tps,
                config.max_frame_delta,
                config.max_ticks_per_frame,
            ),
            pacer: RenderPacer::new(config.max_render_fps),
            rates: RateWindow::open(now, config.metrics_log_interval),
            last_frame: now,
            overlay_visible: config.overlay_visible_on_start,
            shown_title: None,
            config,
            window,
            renderer,
            runtime,
        }
    }

    fn start(&mut self) {
        // `world_ready` runs inside `load`, so the scene is ready before its first tick.
        self.runtime.load();
        info!(
            entity_count = self.runtime.world().entity_count(),
            "scene_loaded"
        );
        info!(
            target_tps = self.clock.ticks_per_second(),
            max_frame_delta_ms = self.clock.max_frame_delta().as_millis() as u64,
            max_ticks_per_frame = self.clock.max_ticks(),
            render_fps_cap = ?self.pacer.cap(),
            "loop_config"
        );
        self.last_frame = Instant::now();
    }

    fn handle_event(&mut self, event: Event<()>, target: &EventLoopWindowTarget<()>) {
        match event {
            Event::WindowEvent { window_id, event } if window_id == self.window.id() => {
                self.handle_window_event(event, target);
            }
            Event::AboutToWait => match self.pacer.wait_until(Instant::now()) {
                Some(deadline) => target.set_control_flow(ControlFlow::WaitUntil(deadline)),
                None => {
                    target.set_control_flow(ControlFlow::Poll);
                    self.window.request_redraw();
                }
            },
            Event::LoopExiting => {
                self.runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        }
    }

    fn handle_window_event(&mut self, event: WindowEvent, target: &EventLoopWindowTarget<()>) {
        match event {
            WindowEvent::CloseRequested => {
                self.input.request_quit();
                info!(reason = "window_close", "shutdown_requested");
                target.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.window.inner_size();
                self.input.set_window_size(size.width, size.height);
                if let Err(error) = self.renderer.resize(size.width, size.height) {
                    warn!(error = %error, "renderer_resize_failed");
                    target.exit();
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.input.handle_mouse_wheel(delta),
            WindowEvent::KeyboardInput { event, .. } => {
                self.input.handle_key(event.physical_key, event.state);
                if self.input.quit_requested() {
                    info!(reason = "escape_key", "shutdown_requested");
                    target.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = self.frame() {
                    warn!(error = %error, "renderer_draw_failed");
                    target.exit();
                }
            }
            _ => {}
        }
    }

    /// One presented frame: owed ticks first, then the draw.
    fn frame(&mut self) -> Result<(), PixelsError> {
        if self.input.take_overlay_toggle() {
            self.overlay_visible = !self.overlay_visible;
            info!(overlay_visible = self.overlay_visible, "overlay_toggled");
        }

        let now = Instant::now();
        let steps = self
            .clock
            .advance(now.saturating_duration_since(self.last_frame));
        self.last_frame = now;
        for _ in 0..steps.ticks {
            self.tick();
        }
        self.rates.count_ticks(steps.ticks);
        if !steps.dropped.is_zero() {
            warn!(
                dropped_ms = steps.dropped.as_millis() as u64,
                max_ticks_per_frame = self.clock.max_ticks(),
                "sim_backlog_dropped"
            );
        }

        let world = self.runtime.world();
        let overlay = self.overlay_visible.then(|| OverlayData {
            rates: self.rates.latest(),
            render_fps_cap: self.pacer.cap(),
            entity_count: world.entity_count(),
            visible_entity_count: world.visible_entity_count(),
            scene_lines: self.runtime.debug_lines(),
        });
        self.renderer.render_world(world, overlay.as_ref())?;
        self.pacer.presented(Instant::now());
        self.rates.count_frame();

        self.sync_title();
        if let Some(rates) = self.rates.roll(now) {
            info!(
                fps = rates.fps,
                tps = rates.tps,
                entity_count = self.runtime.world().entity_count(),
                "loop_metrics"
            );
        }
        Ok(())
    }

    fn tick(&mut self) {
        let input = self.input.next_tick_input();
        match self.runtime.update(self.clock.step_seconds(), &input) {
            SceneCommand::Restart => {
                self.runtime.restart();
                info!(
                    entity_count = self.runtime.world().entity_count(),
                    "scene_restarted"
                );
            }
            SceneCommand::None => {}
        }
    }

    fn sync_title(&mut self) {
        let title = self.runtime.debug_title();
        if title != self.shown_title {
            self.window
                .set_title(title.as_deref().unwrap_or(&self.config.window_title));
            self.shown_title = title;
        }
    }
}
