//! Frame-driven animation: audio readiness state machine plus the per-frame update.
//!
//! The driver does not own a window or a timer. Each call to [`AnimationDriver::tick`]
//! is one display-refresh callback; the [`FrameSink`] decides what "schedule the next
//! frame" and "redraw" mean (a winit window, a headless logger, a test recorder).

mod frame;
mod scheduler;

pub use frame::{animate_primitives, apply_displacement, apply_scale};
pub use scheduler::{RunSummary, Scheduler, StopReason};

use std::time::Duration;

use crate::audio::{AudioPoll, PendingAudio, SpectrumSource};
use crate::clock::{AnimationClock, Clock};
use crate::mapping::MagnitudeRange;
use crate::params::MotionParams;
use crate::scene::{Scene, VisualPrimitive};
use crate::variant::FrameMapping;

/// Everything a redraw needs for one frame
#[derive(Debug)]
pub struct Frame<'a> {
    /// Frames redrawn so far, starting at 0
    pub number: u64,

    /// Seconds since startup
    pub elapsed_s: f32,

    /// Value of the shader `time` uniform
    pub time: f32,

    pub primitives: &'a [VisualPrimitive],
}

/// Receiver of the driver's per-frame side effects
pub trait FrameSink {
    /// Ask for another tick on the next display refresh
    fn schedule_next(&mut self);

    /// Draw the frame
    fn redraw(&mut self, frame: &Frame<'_>);
}

/// Internal state, including the pending or live audio source
#[derive(Debug)]
enum DriverState<S> {
    Uninitialized,
    WaitingForAudio {
        pending: PendingAudio<S>,
        since: Duration,
    },
    Running(S),
    AudioFailed(String),
}

/// Observable driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Uninitialized,
    WaitingForAudio,
    Running,
    /// Audio never became available; the animation will not start
    AudioFailed,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not started, or audio failed: nothing scheduled, nothing drawn
    Idle,
    /// Still waiting for audio; next tick scheduled, nothing drawn
    Waiting,
    Redrawn,
}

/// Drives primitives from the live spectrum once audio is ready
pub struct AnimationDriver<S, C> {
    state: DriverState<S>,
    clock: C,
    animation_clock: AnimationClock,
    mapping: FrameMapping,
    range: MagnitudeRange,
    motion: MotionParams,
    frames: u64,
}

impl<S: SpectrumSource, C: Clock> AnimationDriver<S, C> {
    pub fn new(
        mapping: FrameMapping,
        range: MagnitudeRange,
        motion: MotionParams,
        clock: C,
    ) -> Self {
        Self {
            state: DriverState::Uninitialized,
            clock,
            animation_clock: AnimationClock::default(),
            mapping,
            range,
            motion,
            frames: 0,
        }
    }

    /// Startup: reset the animation clock and begin waiting for audio
    pub fn start(&mut self, pending: PendingAudio<S>) {
        if !matches!(self.state, DriverState::Uninitialized) {
            log::warn!("Animation driver already started; ignoring second start");
            return;
        }

        let now = self.clock.now();
        self.animation_clock.reset(now);
        self.state = DriverState::WaitingForAudio {
            pending,
            since: now,
        };
        log::info!("Waiting for audio input...");
    }

    pub fn phase(&self) -> DriverPhase {
        match self.state {
            DriverState::Uninitialized => DriverPhase::Uninitialized,
            DriverState::WaitingForAudio { .. } => DriverPhase::WaitingForAudio,
            DriverState::Running(_) => DriverPhase::Running,
            DriverState::AudioFailed(_) => DriverPhase::AudioFailed,
        }
    }

    /// Why audio failed, if it did
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            DriverState::AudioFailed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Frames redrawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds since startup as of the last frame
    pub fn elapsed_s(&self) -> f32 {
        self.animation_clock.elapsed_s()
    }

    /// Check whether the pending audio source has resolved
    pub fn poll_audio(&mut self) -> DriverPhase {
        let (result, waited) = match &self.state {
            DriverState::WaitingForAudio { pending, since } => {
                let waited = self.clock.now().saturating_sub(*since);
                (pending.poll(waited), waited)
            }
            _ => return self.phase(),
        };

        match result {
            AudioPoll::Pending => {}
            AudioPoll::Ready(source) => {
                log::info!("Audio ready after {:.2}s, animation running", waited.as_secs_f32());
                self.state = DriverState::Running(source);
            }
            AudioPoll::Failed(e) => {
                log::warn!("Animation will not start: {}", e);
                self.state = DriverState::AudioFailed(e.to_string());
            }
            AudioPoll::TimedOut => {
                let reason = format!("no audio input after {:.1}s", waited.as_secs_f32());
                log::error!("Animation will not start: {}", reason);
                self.state = DriverState::AudioFailed(reason);
            }
        }

        self.phase()
    }

    /// One display-refresh callback.
    ///
    /// While running: schedule next, read spectrum, update primitives, update the
    /// clock, redraw. Never redraws before audio is ready.
    pub fn tick(&mut self, scene: &mut Scene, sink: &mut impl FrameSink) -> TickOutcome {
        match self.poll_audio() {
            DriverPhase::Uninitialized | DriverPhase::AudioFailed => return TickOutcome::Idle,
            DriverPhase::WaitingForAudio => {
                sink.schedule_next();
                return TickOutcome::Waiting;
            }
            DriverPhase::Running => {}
        }

        let DriverState::Running(source) = &self.state else {
            return TickOutcome::Idle;
        };

        sink.schedule_next();

        let spectrum = source.frequencies();

        let now = self.clock.now();
        let t = self.animation_clock.elapsed_at(now) * self.motion.time_scale;
        animate_primitives(
            &mut scene.primitives,
            &spectrum,
            &self.range,
            self.mapping,
            &self.motion,
            t,
        );

        let elapsed_s = self.animation_clock.sample(now);

        sink.redraw(&Frame {
            number: self.frames,
            elapsed_s,
            time: elapsed_s * self.motion.time_scale,
            primitives: &scene.primitives,
        });
        self.frames += 1;

        TickOutcome::Redrawn
    }
}
