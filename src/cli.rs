//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{initialize, open_wav, AudioSource, PendingAudio};
use crate::error::{Result, VisualizerError};
use crate::params::{AnalyserConfig, RenderConfig};
use crate::rendering::{PipelineSource, ShaderSources};
use crate::variant::{Material, Variant};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "freqdance")]
#[command(about = "Audio-reactive 3D spectrum visualizer", long_about = None)]
pub struct Args {
    /// Which scene to show
    #[arg(long, value_enum, default_value_t = Variant::Cubes)]
    pub variant: Variant,

    /// Analyser FFT size (power of two, 32..=32768); bins = size / 2
    #[arg(long, value_name = "SAMPLES", default_value_t = 64)]
    pub fft_size: usize,

    /// Analyse a looping WAV file instead of the microphone
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// WGSL vertex stage for the shader material (entry point `vs_main`)
    #[arg(long, value_name = "FILE")]
    pub vertex_shader: Option<PathBuf>,

    /// WGSL fragment stage for the shader material (entry point `fs_main`)
    #[arg(long, value_name = "FILE")]
    pub fragment_shader: Option<PathBuf>,

    /// Give up waiting for audio after this long (default: wait forever)
    #[arg(long, value_name = "SECONDS")]
    pub audio_timeout: Option<f32>,

    /// Seed for the initial displacement noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,

    /// Run without a window for this many animated frames, logging each one
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,
}

impl Args {
    /// Analyser settings from `--fft-size`, validated
    pub fn analyser_config(&self) -> Result<AnalyserConfig> {
        let config = AnalyserConfig::with_fft_size(self.fft_size);
        config.validate()?;
        Ok(config)
    }

    pub fn render_config(&self) -> Result<RenderConfig> {
        if self.width == 0 || self.height == 0 {
            return Err(VisualizerError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..RenderConfig::default()
        })
    }

    pub fn audio_timeout(&self) -> Result<Option<Duration>> {
        self.audio_timeout
            .map(|secs| {
                Duration::try_from_secs_f32(secs).map_err(|_| {
                    VisualizerError::InvalidConfig(format!(
                        "audio timeout must be a non-negative number of seconds, got {}",
                        secs
                    ))
                })
            })
            .transpose()
    }

    /// Pipeline program for the chosen variant. Shader files are read here, once.
    pub fn pipeline_source(&self) -> Result<PipelineSource> {
        match self.variant.material() {
            Material::Normal => Ok(PipelineSource::Normal),
            Material::Shader => Ok(PipelineSource::Shader(ShaderSources::load(
                self.vertex_shader.as_deref(),
                self.fragment_shader.as_deref(),
            )?)),
        }
    }

    /// Start the microphone, or the WAV file when `--input` is given
    pub fn open_audio(&self, config: AnalyserConfig) -> Result<PendingAudio<AudioSource>> {
        let timeout = self.audio_timeout()?;
        let pending = match &self.input {
            Some(path) => {
                log::info!("Audio input: {}", path.display());
                open_wav(path.clone(), config)
            }
            None => {
                log::info!("Audio input: default microphone");
                initialize(config)
            }
        };
        Ok(pending.with_timeout(timeout))
    }
}
