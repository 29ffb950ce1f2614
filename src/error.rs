//! Error types for audio capture, configuration and rendering setup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the audio source boundary
#[derive(Error, Debug)]
pub enum AudioError {
    /// No default input device (or the user denied microphone access)
    #[error("No audio input device available")]
    NoInputDevice,

    /// The device refused to report a usable input configuration
    #[error("Failed to get audio input config: {0}")]
    Config(String),

    /// Sample format cpal reports but we cannot convert
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build audio input stream: {0}")]
    BuildStream(String),

    #[error("Failed to start audio input stream: {0}")]
    PlayStream(String),

    /// Error reading a WAV file used in place of the microphone
    #[error("Failed to read WAV file '{}': {reason}", .path.display())]
    WavRead { path: PathBuf, reason: String },

    /// Analyser configuration rejected by validation
    #[error("Invalid analyser config: {0}")]
    InvalidConfig(String),

    /// The audio thread went away without reporting a result
    #[error("Audio thread exited before the source became ready")]
    Disconnected,
}

impl AudioError {
    /// Creates a WAV read error with path and reason
    pub fn wav_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AudioError::WavRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Top-level error type for the visualizer
#[derive(Error, Debug)]
pub enum VisualizerError {
    /// `normalize` would divide by zero
    #[error("Degenerate magnitude range: min {min} equals max {max}")]
    DegenerateRange { min: f32, max: f32 },

    /// Shader source could not be loaded at startup
    #[error("Failed to load shader '{}': {source}", .path.display())]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// GPU surface, adapter or device could not be set up
    #[error("Render setup failed: {0}")]
    RenderSetup(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Type alias for Result using VisualizerError
pub type Result<T> = std::result::Result<T, VisualizerError>;
