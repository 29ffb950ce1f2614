//! Audio analysis configuration and constants.

use crate::error::AudioError;

/// Smallest FFT window the analyser accepts
pub const MIN_FFT_SIZE: usize = 32;

/// Largest FFT window the analyser accepts
pub const MAX_FFT_SIZE: usize = 32768;

/// FFT analyser configuration (byte frequency data)
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size in samples (power of 2, 32..=32768)
    /// Produces `fft_size / 2` frequency bins
    pub fft_size: usize,

    /// Exponential smoothing between analyses (0 = none, <1)
    pub smoothing_time_constant: f32,

    /// Magnitude (dB) mapped to byte 0
    pub min_decibels: f32,

    /// Magnitude (dB) mapped to byte 255
    pub max_decibels: f32,

    /// Analysis interval (milliseconds)
    /// 16 ms ≈ one analysis per 60 Hz frame
    pub update_interval_ms: u64,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 64,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            update_interval_ms: 16,
        }
    }
}

impl AnalyserConfig {
    /// Create a config with the given FFT size and default analysis settings
    pub fn with_fft_size(fft_size: usize) -> Self {
        Self {
            fft_size,
            ..Self::default()
        }
    }

    /// Number of frequency bins in each spectrum
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), AudioError> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(AudioError::InvalidConfig(format!(
                "FFT size must be a power of 2 in {}..={}, got {}",
                MIN_FFT_SIZE, MAX_FFT_SIZE, self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(AudioError::InvalidConfig(format!(
                "smoothing time constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(AudioError::InvalidConfig(format!(
                "min decibels ({}) must be below max decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_yields_32_bins() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 32);
    }

    #[test]
    fn test_validate_rejects_bad_fft_sizes() {
        assert!(AnalyserConfig::with_fft_size(48).validate().is_err());
        assert!(AnalyserConfig::with_fft_size(16).validate().is_err());
        assert!(AnalyserConfig::with_fft_size(65536).validate().is_err());
        assert!(AnalyserConfig::with_fft_size(2048).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_decibel_range() {
        let config = AnalyserConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..AnalyserConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
