//! WAV file playback as a stand-in for the microphone.
//!
//! The file is decoded up front, downmixed to mono and fed into the analyser at
//! its native sample rate, looping forever.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::analyser::SampleWindow;
use super::pending::{AudioReady, PendingAudio};
use super::system::AudioSource;
use crate::error::AudioError;
use crate::params::AnalyserConfig;

/// Feed granularity (milliseconds of audio per push)
const FEED_CHUNK_MS: u64 = 10;

/// Decoded mono clip
#[derive(Debug, Clone)]
pub struct WavClip {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl WavClip {
    /// Decode a WAV file into mono f32 samples in [-1, 1]
    pub fn load(path: &Path) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path).map_err(|e| AudioError::wav_read(path, e))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::wav_read(path, e))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| AudioError::wav_read(path, e))?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        if samples.is_empty() {
            return Err(AudioError::wav_read(path, "file contains no samples"));
        }

        Ok(Self {
            sample_rate_hz: spec.sample_rate,
            samples,
        })
    }

    /// Number of samples in one feed chunk
    fn chunk_len(&self) -> usize {
        ((self.sample_rate_hz as u64 * FEED_CHUNK_MS / 1000) as usize).max(1)
    }
}

/// Open `path` and stream it through the analyser in the background
pub fn open_wav(path: impl Into<PathBuf>, config: AnalyserConfig) -> PendingAudio<AudioSource> {
    let path = path.into();
    let (ready, pending) = PendingAudio::channel();

    let spawned = thread::Builder::new()
        .name("audio-wav".to_string())
        .spawn(move || run_wav_feed(path, config, ready));

    if let Err(e) = spawned {
        log::error!("Failed to spawn WAV feed thread: {}", e);
    }

    pending
}

fn run_wav_feed(path: PathBuf, config: AnalyserConfig, ready: AudioReady<AudioSource>) {
    let clip = match config.validate().and_then(|_| WavClip::load(&path)) {
        Ok(clip) => clip,
        Err(e) => {
            log::error!("{}", e);
            ready.send(Err(e));
            return;
        }
    };

    log::info!(
        "Audio input: {} @ {}Hz, {:.1}s (looping)",
        path.display(),
        clip.sample_rate_hz,
        clip.samples.len() as f32 / clip.sample_rate_hz as f32
    );

    let samples = Arc::new(Mutex::new(SampleWindow::new(config.fft_size)));
    let running = Arc::new(AtomicBool::new(true));
    let source = AudioSource::start(config, Arc::clone(&samples), Arc::clone(&running));

    if !ready.send(Ok(source)) {
        return;
    }

    let chunk_len = clip.chunk_len();
    let chunk_duration = Duration::from_millis(FEED_CHUNK_MS);
    let mut position = 0;
    let mut next_deadline = Instant::now();

    while running.load(Ordering::Relaxed) {
        {
            let mut window = samples.lock();
            for _ in 0..chunk_len {
                window.push(clip.samples[position]);
                position = (position + 1) % clip.samples.len();
            }
        }

        next_deadline += chunk_duration;
        thread::sleep(next_deadline.saturating_duration_since(Instant::now()));
    }

    log::info!("WAV feed stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioPoll, SpectrumSource};
    use std::f32::consts::PI;

    fn write_wav(name: &str, spec: hound::WavSpec, frames: &[Vec<f32>]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "freqdance-{}-{}.wav",
            name,
            std::process::id()
        ));
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                match spec.sample_format {
                    hound::SampleFormat::Float => writer.write_sample(s).unwrap(),
                    hound::SampleFormat::Int => {
                        writer.write_sample((s * i16::MAX as f32) as i16).unwrap()
                    }
                }
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_load_downmixes_stereo_int() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = write_wav("stereo", spec, &[vec![0.5, -0.5], vec![0.5, 0.5]]);

        let clip = WavClip::load(&path).unwrap();
        assert_eq!(clip.sample_rate_hz, 8000);
        assert_eq!(clip.samples.len(), 2);
        assert!(clip.samples[0].abs() < 1e-3);
        assert!((clip.samples[1] - 0.5).abs() < 1e-3);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_wav_error() {
        let err = WavClip::load(Path::new("/nonexistent/freqdance.wav")).unwrap_err();
        assert!(matches!(err, AudioError::WavRead { .. }));
    }

    #[test]
    fn test_open_wav_becomes_ready_and_analyses() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        // 3000 Hz lands exactly on bin 4 at 48 kHz with a 64-point FFT
        let frames: Vec<Vec<f32>> = (0..48_000)
            .map(|i| vec![(2.0 * PI * 3000.0 * i as f32 / 48_000.0).sin()])
            .collect();
        let path = write_wav("sine", spec, &frames);

        let config = AnalyserConfig {
            update_interval_ms: 1,
            ..AnalyserConfig::default()
        };
        let pending = open_wav(&path, config).with_timeout(Some(Duration::from_secs(5)));
        let source = match pending.wait() {
            AudioPoll::Ready(source) => source,
            other => panic!("expected ready source, got {:?}", other),
        };

        thread::sleep(Duration::from_millis(100));
        let spectrum = source.frequencies();
        assert_eq!(spectrum.len(), 32);
        assert!(spectrum.bin(4) > spectrum.bin(20));

        drop(source);
        std::fs::remove_file(path).ok();
    }
}
