//! Microphone capture and the live audio source handle.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::analyser::{spawn_analysis_thread, SampleWindow};
use super::pending::{AudioReady, PendingAudio};
use super::spectrum::{FrequencySpectrum, SpectrumSource};
use crate::error::AudioError;
use crate::params::AnalyserConfig;

/// How often the capture thread checks whether it should release the stream
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Live audio source: a capture feed plus its analysis thread
///
/// Dropping the source stops capture and analysis.
#[derive(Debug)]
pub struct AudioSource {
    /// Shared spectrum (written by the analysis thread)
    spectrum: Arc<Mutex<FrequencySpectrum>>,

    /// Cleared on drop to stop the background threads
    running: Arc<AtomicBool>,

    bin_count: usize,
}

impl AudioSource {
    /// Start analysing `samples` and wrap everything in a source handle
    pub(crate) fn start(
        config: AnalyserConfig,
        samples: Arc<Mutex<SampleWindow>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let bin_count = config.bin_count();
        let spectrum = Arc::new(Mutex::new(FrequencySpectrum::new(bin_count)));

        spawn_analysis_thread(config, samples, Arc::clone(&spectrum), Arc::clone(&running));

        Self {
            spectrum,
            running,
            bin_count,
        }
    }

    /// Number of frequency bins this source produces
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }
}

impl SpectrumSource for AudioSource {
    fn frequencies(&self) -> FrequencySpectrum {
        self.spectrum.lock().clone()
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Request microphone access and start analysis in the background.
///
/// The returned handle yields exactly one result. On failure the error is logged
/// here and reported through the handle; no source is ever produced.
pub fn initialize(config: AnalyserConfig) -> PendingAudio<AudioSource> {
    let (ready, pending) = PendingAudio::channel();

    let spawned = thread::Builder::new()
        .name("audio-capture".to_string())
        .spawn(move || run_capture(config, ready));

    // A failed spawn drops `ready`, which the pending side sees as a disconnect
    if let Err(e) = spawned {
        log::error!("Failed to spawn audio thread: {}", e);
    }

    pending
}

/// Body of the capture thread: open the device, report, then keep the stream alive
fn run_capture(config: AnalyserConfig, ready: AudioReady<AudioSource>) {
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        ready.send(Err(e));
        return;
    }

    let samples = Arc::new(Mutex::new(SampleWindow::new(config.fft_size)));

    let stream = match open_microphone(Arc::clone(&samples)) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("{}", e);
            ready.send(Err(e));
            return;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let source = AudioSource::start(config, samples, Arc::clone(&running));

    if !ready.send(Ok(source)) {
        log::warn!("Audio source ready but nobody is waiting for it");
        return;
    }

    // cpal streams are not Send, so the stream lives on this thread until the
    // source is dropped
    while running.load(Ordering::Relaxed) {
        thread::park_timeout(STOP_POLL_INTERVAL);
    }

    drop(stream);
    log::info!("Microphone capture stopped");
}

/// Open the default input device and feed its samples into `samples`
fn open_microphone(samples: Arc<Mutex<SampleWindow>>) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioError::NoInputDevice)?;

    let config = device
        .default_input_config()
        .map_err(|e| AudioError::Config(e.to_string()))?;

    log::info!(
        "Audio input: {} @ {}Hz, {} channel(s)",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0,
        config.channels()
    );

    let sample_format = config.sample_format();
    let stream_config: cpal::StreamConfig = config.into();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_input_stream::<f32>(&device, &stream_config, samples),
        cpal::SampleFormat::I16 => build_input_stream::<i16>(&device, &stream_config, samples),
        cpal::SampleFormat::U16 => build_input_stream::<u16>(&device, &stream_config, samples),
        cpal::SampleFormat::I32 => build_input_stream::<i32>(&device, &stream_config, samples),
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    }?;

    stream
        .play()
        .map_err(|e| AudioError::PlayStream(e.to_string()))?;

    Ok(stream)
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Mutex<SampleWindow>>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let mut converted: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|&s| f32::from_sample(s)));
                samples.lock().push_interleaved(&converted, channels);
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_reports_bin_count_and_stops_on_drop() {
        let config = AnalyserConfig {
            update_interval_ms: 1,
            ..AnalyserConfig::default()
        };
        let samples = Arc::new(Mutex::new(SampleWindow::new(config.fft_size)));
        let running = Arc::new(AtomicBool::new(true));

        let source = AudioSource::start(config, samples, Arc::clone(&running));
        assert_eq!(source.bin_count(), 32);
        assert_eq!(source.frequencies().len(), 32);

        drop(source);
        assert!(!running.load(Ordering::Relaxed));
    }

    #[test]
    fn test_analysis_thread_publishes_spectrum() {
        let config = AnalyserConfig {
            update_interval_ms: 1,
            ..AnalyserConfig::default()
        };
        let samples = Arc::new(Mutex::new(SampleWindow::new(config.fft_size)));
        // 3000 Hz at 48 kHz: exactly bin 4 of a 64-point FFT
        let tone: Vec<f32> = (0..config.fft_size)
            .map(|i| (2.0 * std::f32::consts::PI * 3000.0 * i as f32 / 48_000.0).sin())
            .collect();
        samples.lock().push_interleaved(&tone, 1);

        let source = AudioSource::start(config, samples, Arc::new(AtomicBool::new(true)));
        // Starts silent; only the analysis thread can raise bin 4
        let mut published = source.frequencies();
        for _ in 0..200 {
            if published.bin(4) > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
            published = source.frequencies();
        }

        assert!(published.bin(4) > 0);
        assert!(published.bin(4) >= published.bin(20));
    }
}
