//! FFT analysis thread and utilities.
//!
//! Produces byte frequency data the way a browser `AnalyserNode` does: Blackman
//! window, magnitude per bin, exponential smoothing, then decibels mapped onto
//! 0..=255.

use parking_lot::Mutex;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::spectrum::FrequencySpectrum;
use crate::params::AnalyserConfig;

/// Blackman window coefficient (alpha)
const BLACKMAN_ALPHA: f32 = 0.16;

/// Rolling window of the most recent mono samples
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append interleaved frames, averaging channels down to mono
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            self.push(mono);
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copy the window into `out`, zero-padding at the front while still filling
    pub fn copy_to(&self, out: &mut [f32]) {
        let pad = out.len().saturating_sub(self.samples.len());
        out[..pad].fill(0.0);
        for (dst, src) in out[pad..].iter_mut().zip(self.samples.iter()) {
            *dst = *src;
        }
    }
}

/// Stateful spectrum analyser (keeps smoothing state between calls)
pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| blackman_window(i, config.fft_size))
            .collect();

        Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); config.fft_size],
            smoothed: vec![0.0; config.bin_count()],
            config,
        }
    }

    /// Analyse `samples` (exactly `fft_size` long) and write byte magnitudes to `out`
    pub fn process(&mut self, samples: &[f32], out: &mut FrequencySpectrum) {
        debug_assert_eq!(samples.len(), self.config.fft_size);

        // Apply Blackman window
        for ((dst, &sample), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *dst = Complex::new(sample * w, 0.0);
        }

        self.fft.process(&mut self.buffer);

        let n = self.config.fft_size as f32;
        let tau = self.config.smoothing_time_constant;
        let db_span = self.config.max_decibels - self.config.min_decibels;

        if out.len() != self.smoothed.len() {
            *out = FrequencySpectrum::new(self.smoothed.len());
        }

        for ((smoothed, bin), byte) in self
            .smoothed
            .iter_mut()
            .zip(&self.buffer)
            .zip(out.as_mut_slice())
        {
            let magnitude = bin.norm() / n;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            let db = 20.0 * smoothed.log10();
            let scaled = (db - self.config.min_decibels) * 255.0 / db_span;
            // log10(0) = -inf clamps to 0
            *byte = scaled.floor().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Spawn FFT analysis thread
///
/// Runs until `running` is cleared, analysing the shared sample window every
/// `update_interval_ms` and publishing the result into `spectrum`.
pub fn spawn_analysis_thread(
    config: AnalyserConfig,
    samples: Arc<Mutex<SampleWindow>>,
    spectrum: Arc<Mutex<FrequencySpectrum>>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let interval = Duration::from_millis(config.update_interval_ms);
        let mut input = vec![0.0; config.fft_size];
        let mut output = FrequencySpectrum::new(config.bin_count());
        let mut analyser = SpectrumAnalyser::new(config);

        while running.load(Ordering::Relaxed) {
            thread::sleep(interval);

            samples.lock().copy_to(&mut input);
            analyser.process(&input, &mut output);

            spectrum.lock().clone_from(&output);
        }

        log::debug!("Analysis thread stopped");
    })
}

/// Blackman window function for FFT analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let a0 = 0.5 * (1.0 - BLACKMAN_ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * BLACKMAN_ALPHA;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}
