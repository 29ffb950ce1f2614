//! Microphone capture and FFT analysis.
//!
//! Captures live audio with cpal, analyses it with rustfft on a background
//! thread and exposes the result as a byte frequency spectrum.

mod analyser;
mod pending;
mod spectrum;
mod system;
mod wav;

// Re-export public types
pub use analyser::{blackman_window, spawn_analysis_thread, SampleWindow, SpectrumAnalyser};
pub use pending::{AudioPoll, AudioReady, PendingAudio};
pub use spectrum::{FixedSpectrum, FrequencySpectrum, SpectrumSource};
pub use system::{initialize, AudioSource};
pub use wav::{open_wav, WavClip};
