//! Explicit frame loop for running the driver without a display.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{AnimationDriver, Frame, FrameSink, TickOutcome};
use crate::audio::SpectrumSource;
use crate::clock::Clock;
use crate::scene::Scene;

/// Why [`Scheduler::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Requested number of frames was redrawn
    FrameLimit,
    /// Stop flag was raised
    Stopped,
    /// The driver did not ask for another tick (audio failed or never started)
    NotRescheduled,
}

/// Counts from one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames_redrawn: u64,
    pub reason: StopReason,
}

/// Fixed-interval tick loop with an explicit stop condition
#[derive(Debug, Clone)]
pub struct Scheduler {
    frame_interval: Duration,
    max_frames: Option<u64>,
    stop: Option<Arc<AtomicBool>>,
}

impl Scheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            max_frames: None,
            stop: None,
        }
    }

    /// Stop after this many redrawn frames
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Stop as soon as `flag` is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Tick until a stop condition holds. `wait` is called between ticks with the
    /// frame interval; pass a sleep for real time or a clock step for tests.
    pub fn run<S, C, K>(
        &self,
        driver: &mut AnimationDriver<S, C>,
        scene: &mut Scene,
        sink: &mut K,
        mut wait: impl FnMut(Duration),
    ) -> RunSummary
    where
        S: SpectrumSource,
        C: Clock,
        K: FrameSink,
    {
        let mut ticks = 0;
        let mut frames_redrawn = 0;

        let reason = loop {
            if self.stop.as_ref().is_some_and(|f| f.load(Ordering::Relaxed)) {
                break StopReason::Stopped;
            }
            if self.max_frames.is_some_and(|max| frames_redrawn >= max) {
                break StopReason::FrameLimit;
            }

            let mut tracking = TrackingSink {
                inner: &mut *sink,
                scheduled: false,
            };
            if driver.tick(scene, &mut tracking) == TickOutcome::Redrawn {
                frames_redrawn += 1;
            }
            ticks += 1;

            if !tracking.scheduled {
                break StopReason::NotRescheduled;
            }

            wait(self.frame_interval);
        };

        RunSummary {
            ticks,
            frames_redrawn,
            reason,
        }
    }
}

/// Forwards to the real sink and notes whether a next tick was requested
struct TrackingSink<'a, K> {
    inner: &'a mut K,
    scheduled: bool,
}

impl<K: FrameSink> FrameSink for TrackingSink<'_, K> {
    fn schedule_next(&mut self) {
        self.scheduled = true;
        self.inner.schedule_next();
    }

    fn redraw(&mut self, frame: &Frame<'_>) {
        self.inner.redraw(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::tests::{driver, RecordingSink};
    use crate::audio::{FixedSpectrum, FrequencySpectrum, PendingAudio};
    use crate::clock::ManualClock;
    use crate::error::AudioError;
    use crate::variant::Variant;

    #[test]
    fn test_runs_to_frame_limit_on_manual_clock() {
        let clock = ManualClock::new();
        let mut driver = driver(Variant::ShaderCubes, &clock);
        let mut scene = Scene::build(&Variant::ShaderCubes.scene_config(Some(3)));
        let mut sink = RecordingSink::default();

        let (ready, pending) = PendingAudio::channel();
        driver.start(pending);
        ready.send(Ok(FixedSpectrum(FrequencySpectrum::filled(32, 255))));

        let step = clock.clone();
        let summary = Scheduler::new(Duration::from_millis(100))
            .with_max_frames(10)
            .run(&mut driver, &mut scene, &mut sink, |d| step.advance(d));

        assert_eq!(summary.reason, StopReason::FrameLimit);
        assert_eq!(summary.frames_redrawn, 10);
        assert_eq!(sink.redraws.len(), 10);
        // Ten frames 100 ms apart: the last one is at 0.9 s → time 9.0
        assert!((sink.redraws[9].1 - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_stop_flag_ends_waiting_loop() {
        let clock = ManualClock::new();
        let mut driver = driver(Variant::Cubes, &clock);
        let mut scene = Scene::build(&Variant::Cubes.scene_config(Some(3)));
        let mut sink = RecordingSink::default();

        let (_ready, pending) = PendingAudio::<FixedSpectrum>::channel();
        driver.start(pending);

        let flag = Arc::new(AtomicBool::new(false));
        let raise = Arc::clone(&flag);
        let step = clock.clone();
        let summary = Scheduler::new(Duration::from_millis(16))
            .with_stop_flag(flag)
            .run(&mut driver, &mut scene, &mut sink, |d| {
                step.advance(d);
                if step.now() >= Duration::from_millis(160) {
                    raise.store(true, Ordering::Relaxed);
                }
            });

        assert_eq!(summary.reason, StopReason::Stopped);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.frames_redrawn, 0);
        assert!(sink.redraws.is_empty());
    }

    #[test]
    fn test_failed_audio_is_not_rescheduled() {
        let clock = ManualClock::new();
        let mut driver = driver(Variant::Cubes, &clock);
        let mut scene = Scene::build(&Variant::Cubes.scene_config(Some(3)));
        let mut sink = RecordingSink::default();

        let (ready, pending) = PendingAudio::channel();
        driver.start(pending);
        ready.send(Err(AudioError::NoInputDevice));

        let summary = Scheduler::new(Duration::from_millis(16))
            .with_max_frames(100)
            .run(&mut driver, &mut scene, &mut sink, |_| {});

        assert_eq!(summary.reason, StopReason::NotRescheduled);
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.frames_redrawn, 0);
    }
}
