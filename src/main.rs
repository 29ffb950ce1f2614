//! freqdance - shapes that dance to the live audio spectrum
//!
//! One primitive per frequency bin: cubes stretch, spheres ripple.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Mat4;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use freqdance::animation::{
    AnimationDriver, DriverPhase, Frame, FrameSink, Scheduler, StopReason, TickOutcome,
};
use freqdance::audio::{AudioSource, PendingAudio};
use freqdance::camera::OrbitCamera;
use freqdance::cli::Args;
use freqdance::clock::SystemClock;
use freqdance::error::{Result, VisualizerError};
use freqdance::mapping::MagnitudeRange;
use freqdance::params::{AnalyserConfig, MotionParams, RenderConfig};
use freqdance::rendering::{PipelineSource, RenderSystem};
use freqdance::scene::Scene;
use freqdance::variant::Variant;

/// Poll interval while waiting for audio
const AUDIO_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Wheel pixels per zoom step (touchpads report pixel deltas)
const PIXELS_PER_WHEEL_STEP: f32 = 50.0;

type Driver = AnimationDriver<AudioSource, SystemClock>;

/// Main application state
struct App {
    variant: Variant,
    render_config: RenderConfig,
    pipeline_source: PipelineSource,

    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Animation
    scene: Scene,
    camera: OrbitCamera,
    driver: Driver,
    pending_audio: Option<PendingAudio<AudioSource>>,

    // Input
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,

    stats: FrameStats,
    failure_shown: bool,

    /// Next waiting-phase tick
    next_audio_poll: Instant,

    /// Set when the window or GPU could not be created
    startup_error: Option<VisualizerError>,
}

impl App {
    fn new(
        variant: Variant,
        render_config: RenderConfig,
        pipeline_source: PipelineSource,
        scene: Scene,
        driver: Driver,
        pending_audio: PendingAudio<AudioSource>,
    ) -> Self {
        let camera = OrbitCamera::new(&render_config);

        Self {
            variant,
            render_config,
            pipeline_source,
            window: None,
            render_system: None,
            scene,
            camera,
            driver,
            pending_audio: Some(pending_audio),
            dragging: false,
            cursor: None,
            stats: FrameStats::new(),
            failure_shown: false,
            next_audio_poll: Instant::now(),
            startup_error: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        // Fixed size: the projection is computed once from the startup aspect ratio
        let window_attributes = Window::default_attributes()
            .with_title(self.variant.title())
            .with_resizable(false)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| VisualizerError::RenderSetup(format!("Failed to create window: {}", e)))?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.scene,
            &self.pipeline_source,
        ))?;

        // Initial static frame, shown while audio starts
        if let Err(e) = render_system.draw(
            &self.scene.primitives,
            self.camera.view(),
            self.camera.projection(),
            0.0,
        ) {
            log::warn!("Initial frame not rendered: {:?}", e);
        }

        if let Some(pending) = self.pending_audio.take() {
            self.driver.start(pending);
        }

        log::info!("{} is running. Drag to orbit, scroll to zoom, ESC to quit", self.variant.title());

        self.window = Some(window);
        self.render_system = Some(render_system);
        Ok(())
    }

    /// One display-refresh callback
    fn tick(&mut self) {
        let (Some(window), Some(render_system)) = (&self.window, &self.render_system) else {
            return;
        };

        // Only a running driver chains redraws; while waiting, `about_to_wait` polls
        let chain_redraws = self.driver.poll_audio() == DriverPhase::Running;
        let mut sink = WindowSink {
            window,
            render_system,
            view: self.camera.view(),
            projection: self.camera.projection(),
            chain_redraws,
        };

        if self.driver.tick(&mut self.scene, &mut sink) == TickOutcome::Redrawn {
            self.stats.record(self.driver.frames(), self.driver.elapsed_s());
        }
    }

    fn show_failure(&mut self) {
        if self.failure_shown {
            return;
        }
        if let (Some(window), Some(reason)) = (&self.window, self.driver.failure()) {
            window.set_title(&format!("{} - audio unavailable: {}", self.variant.title(), reason));
            self.failure_shown = true;
        }
    }

    fn handle_mouse_move(&mut self, position: PhysicalPosition<f64>) {
        if self.dragging {
            if let Some(last) = self.cursor {
                let height = self
                    .window
                    .as_ref()
                    .map_or(self.render_config.window_height, |w| w.inner_size().height);
                self.camera.rotate(
                    (position.x - last.x) as f32,
                    (position.y - last.y) as f32,
                    height as f32,
                );
            }
        }
        self.cursor = Some(position);
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match self.driver.poll_audio() {
            DriverPhase::WaitingForAudio => {
                // One tick per poll interval until audio arrives; redraws chain themselves after
                let now = Instant::now();
                if now >= self.next_audio_poll {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                    self.next_audio_poll = now + AUDIO_POLL_INTERVAL;
                }
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_audio_poll));
            }
            DriverPhase::AudioFailed => {
                self.show_failure();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            DriverPhase::Running => {
                // Audio may have resolved in this poll; kick off the redraw chain
                if self.driver.frames() == 0 {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            DriverPhase::Uninitialized => {
                event_loop.set_control_flow(ControlFlow::Wait);
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init_window(event_loop) {
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_mouse_move(position),
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_WHEEL_STEP,
                };
                self.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => self.tick(),
            _ => {}
        }
    }
}

/// Presents driver frames in the window
struct WindowSink<'a> {
    window: &'a Window,
    render_system: &'a RenderSystem,
    view: Mat4,
    projection: Mat4,
    /// Request the next redraw from `schedule_next`; false while audio is pending
    chain_redraws: bool,
}

impl FrameSink for WindowSink<'_> {
    fn schedule_next(&mut self) {
        if self.chain_redraws {
            self.window.request_redraw();
        }
    }

    fn redraw(&mut self, frame: &Frame<'_>) {
        if let Err(e) = self
            .render_system
            .draw(frame.primitives, self.view, self.projection, frame.time)
        {
            log::error!("Render error: {:?}", e);
        }
    }
}

/// Logs a summary of each frame instead of drawing it
struct LogSink;

impl FrameSink for LogSink {
    fn schedule_next(&mut self) {}

    fn redraw(&mut self, frame: &Frame<'_>) {
        let heights: Vec<String> = frame
            .primitives
            .iter()
            .map(|p| format!("{:.2}", p.scale.y))
            .collect();
        log::info!(
            "frame {} t={:.2}s scale.y=[{}]",
            frame.number,
            frame.elapsed_s,
            heights.join(" ")
        );
    }
}

/// Per-second frame rate for debug logging
struct FrameStats {
    window_start: Instant,
    frames_at_start: u64,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames_at_start: 0,
        }
    }

    fn record(&mut self, frames: u64, elapsed_s: f32) {
        let window = self.window_start.elapsed();
        if window >= Duration::from_secs(1) {
            let fps = (frames - self.frames_at_start) as f32 / window.as_secs_f32();
            log::debug!("{:.1} fps ({} frames, {:.1}s)", fps, frames, elapsed_s);
            self.window_start = Instant::now();
            self.frames_at_start = frames;
        }
    }
}

fn run_headless(
    mut driver: Driver,
    mut scene: Scene,
    pending: PendingAudio<AudioSource>,
    frames: u64,
) -> Result<()> {
    driver.start(pending);

    let summary = Scheduler::new(AUDIO_POLL_INTERVAL)
        .with_max_frames(frames)
        .run(&mut driver, &mut scene, &mut LogSink, std::thread::sleep);

    match summary.reason {
        StopReason::FrameLimit => {
            log::info!("Rendered {} frames in {} ticks", summary.frames_redrawn, summary.ticks);
        }
        StopReason::Stopped | StopReason::NotRescheduled => {
            log::warn!(
                "Stopped after {} frames: {}",
                summary.frames_redrawn,
                driver.failure().unwrap_or("no frames scheduled")
            );
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let analyser: AnalyserConfig = args.analyser_config()?;
    let render_config = args.render_config()?;
    // Shader files are read before anything starts so a bad path aborts cleanly
    let pipeline_source = args.pipeline_source()?;

    let variant = args.variant;
    let scene = Scene::build(&variant.scene_config(args.seed));
    log::info!("{}: {} primitives, {} bins", variant.title(), scene.len(), analyser.bin_count());

    let driver = AnimationDriver::new(
        variant.mapping(),
        MagnitudeRange::BYTE,
        MotionParams::default(),
        SystemClock::new(),
    );
    let pending = args.open_audio(analyser)?;

    if let Some(frames) = args.headless {
        return run_headless(driver, scene, pending, frames);
    }

    let event_loop = EventLoop::new()
        .map_err(|e| VisualizerError::RenderSetup(format!("Failed to create event loop: {}", e)))?;

    let mut app = App::new(variant, render_config, pipeline_source, scene, driver, pending);
    event_loop
        .run_app(&mut app)
        .map_err(|e| VisualizerError::RenderSetup(format!("Event loop error: {}", e)))?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
